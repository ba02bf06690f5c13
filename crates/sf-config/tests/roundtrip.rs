use sf_config::*;

#[test]
fn roundtrip_yaml_default() {
    let config = SimulationConfig::default();
    let path = std::env::temp_dir().join("sf_config_roundtrip_default.yaml");

    save_yaml(&path, &config).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(config, loaded);
}

#[test]
fn roundtrip_json_she() {
    let mut config = SimulationConfig::default()
        .with_holes(false)
        .with_equation(Carrier::Electron, CarrierEquation::She);
    config.scattering.ionized_impurity = true;
    config.nonlinear.damping = 0.5;
    config.nonlinear.time_budget_s = Some(30.0);
    config.linear.kind = LinearKind::BiCgStab;

    let path = std::env::temp_dir().join("sf_config_roundtrip_she.json");
    save_json(&path, &config).unwrap();
    let loaded = load_json(&path).unwrap();

    assert_eq!(config, loaded);
}

#[test]
fn partial_yaml_uses_defaults() {
    let yaml = r#"
version: 1
carriers:
  electrons:
    equation: she
  holes:
    enabled: false
she:
  energy_spacing_ev: 0.02
nonlinear:
  kind: gummel
  max_iterations: 20
  damping: 0.7
linear:
  kind: bicgstab
"#;
    let config = from_yaml_str(yaml).unwrap();
    assert_eq!(config.temperature_k, 300.0);
    assert!(config.poisson.enabled);
    assert_eq!(
        config.enabled_equations(),
        vec![EquationKind::Poisson, EquationKind::ElectronShe]
    );
    assert_eq!(config.she.max_expansion_order, 1);
    assert_eq!(config.she.energy_spacing_ev, 0.02);
    assert_eq!(config.nonlinear.max_iterations, 20);
    assert_eq!(config.nonlinear.divergence_window, 5);
    assert_eq!(config.linear.kind, LinearKind::BiCgStab);
}

#[test]
fn invalid_yaml_is_rejected_on_load() {
    let yaml = "nonlinear:\n  damping: 1.5\n";
    assert!(matches!(
        from_yaml_str(yaml),
        Err(ConfigError::Validation(ValidationError::InvalidValue { .. }))
    ));

    let yaml = "nonlinear:\n  kind: secant\n";
    assert!(matches!(from_yaml_str(yaml), Err(ConfigError::Yaml(_))));
}

#[test]
fn invalid_config_is_not_saved() {
    let mut config = SimulationConfig::default();
    config.linear.tolerance = -1.0;
    let path = std::env::temp_dir().join("sf_config_never_written.yaml");
    let _ = std::fs::remove_file(&path);
    assert!(save_yaml(&path, &config).is_err());
    assert!(!path.exists());
}
