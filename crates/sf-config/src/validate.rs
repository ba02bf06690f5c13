//! Configuration validation logic.

use crate::schema::{LATEST_VERSION, NonlinearKind, SimulationConfig};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported feature: {feature} - {reason}")]
    Unsupported { feature: String, reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },

    #[error("Nothing to solve: all equations are disabled")]
    NothingEnabled,
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn require_positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be positive and finite"))
    }
}

pub fn validate_config(config: &SimulationConfig) -> Result<(), ValidationError> {
    if config.version == 0 || config.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: config.version,
        });
    }

    require_positive("temperature_k", config.temperature_k)?;

    let equations = config.enabled_equations();
    if equations.is_empty() {
        return Err(ValidationError::NothingEnabled);
    }

    validate_nonlinear(config)?;
    validate_linear(config)?;

    if config.uses_she() {
        validate_she(config)?;
    }

    Ok(())
}

fn validate_nonlinear(config: &SimulationConfig) -> Result<(), ValidationError> {
    let nl = &config.nonlinear;

    if nl.max_iterations == 0 {
        return Err(invalid("nonlinear.max_iterations", 0, "must be at least 1"));
    }
    if !(nl.damping > 0.0 && nl.damping <= 1.0) {
        return Err(invalid("nonlinear.damping", nl.damping, "must be in (0, 1]"));
    }
    require_positive("nonlinear.tolerance", nl.tolerance)?;
    if let Some(budget) = nl.time_budget_s {
        require_positive("nonlinear.time_budget_s", budget)?;
    }

    if nl.kind == NonlinearKind::Newton && config.uses_she() {
        return Err(ValidationError::Unsupported {
            feature: "newton".to_string(),
            reason: "the Newton solver only couples drift-diffusion equations".to_string(),
        });
    }
    Ok(())
}

fn validate_linear(config: &SimulationConfig) -> Result<(), ValidationError> {
    if config.linear.max_iterations == 0 {
        return Err(invalid("linear.max_iterations", 0, "must be at least 1"));
    }
    require_positive("linear.tolerance", config.linear.tolerance)
}

fn validate_she(config: &SimulationConfig) -> Result<(), ValidationError> {
    let she = &config.she;
    if she.max_expansion_order != 1 {
        return Err(ValidationError::Unsupported {
            feature: format!("she.max_expansion_order = {}", she.max_expansion_order),
            reason: "only first-order expansions are implemented".to_string(),
        });
    }
    require_positive("she.energy_spacing_ev", she.energy_spacing_ev)?;
    require_positive("she.energy_window_ev", she.energy_window_ev)?;
    if she.energy_window_ev < she.energy_spacing_ev {
        return Err(invalid(
            "she.energy_window_ev",
            she.energy_window_ev,
            "must cover at least one energy level",
        ));
    }
    Ok(())
}
