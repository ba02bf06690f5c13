//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use sf_core::units::{Temperature, k};

pub const LATEST_VERSION: u32 = 1;

/// Charge carrier species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Carrier {
    Electron,
    Hole,
}

impl Carrier {
    /// Sign of the charge in units of `q`.
    pub fn charge_sign(self) -> f64 {
        match self {
            Carrier::Electron => -1.0,
            Carrier::Hole => 1.0,
        }
    }
}

/// Transport model used for one carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarrierEquation {
    /// Drift-diffusion continuity equation for the density.
    #[default]
    Continuity,
    /// Spherical harmonics expansion of the Boltzmann equation.
    She,
}

/// A primary solution quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    Potential,
    ElectronDensity,
    HoleDensity,
    ElectronDistribution,
    HoleDistribution,
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Quantity::Potential => "potential",
            Quantity::ElectronDensity => "electron density",
            Quantity::HoleDensity => "hole density",
            Quantity::ElectronDistribution => "electron distribution",
            Quantity::HoleDistribution => "hole distribution",
        };
        f.write_str(name)
    }
}

/// One equation of the coupled system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquationKind {
    Poisson,
    ElectronContinuity,
    HoleContinuity,
    ElectronShe,
    HoleShe,
}

impl EquationKind {
    /// The quantity this equation solves for.
    pub fn unknown(self) -> Quantity {
        match self {
            EquationKind::Poisson => Quantity::Potential,
            EquationKind::ElectronContinuity => Quantity::ElectronDensity,
            EquationKind::HoleContinuity => Quantity::HoleDensity,
            EquationKind::ElectronShe => Quantity::ElectronDistribution,
            EquationKind::HoleShe => Quantity::HoleDistribution,
        }
    }

    pub fn carrier(self) -> Option<Carrier> {
        match self {
            EquationKind::Poisson => None,
            EquationKind::ElectronContinuity | EquationKind::ElectronShe => Some(Carrier::Electron),
            EquationKind::HoleContinuity | EquationKind::HoleShe => Some(Carrier::Hole),
        }
    }

    pub fn is_she(self) -> bool {
        matches!(self, EquationKind::ElectronShe | EquationKind::HoleShe)
    }

    fn for_carrier(carrier: Carrier, equation: CarrierEquation) -> Self {
        match (carrier, equation) {
            (Carrier::Electron, CarrierEquation::Continuity) => EquationKind::ElectronContinuity,
            (Carrier::Electron, CarrierEquation::She) => EquationKind::ElectronShe,
            (Carrier::Hole, CarrierEquation::Continuity) => EquationKind::HoleContinuity,
            (Carrier::Hole, CarrierEquation::She) => EquationKind::HoleShe,
        }
    }
}

impl std::fmt::Display for EquationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EquationKind::Poisson => "Poisson",
            EquationKind::ElectronContinuity => "electron continuity",
            EquationKind::HoleContinuity => "hole continuity",
            EquationKind::ElectronShe => "electron SHE",
            EquationKind::HoleShe => "hole SHE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_temperature_k")]
    pub temperature_k: f64,
    #[serde(default)]
    pub carriers: CarriersDef,
    #[serde(default)]
    pub poisson: PoissonDef,
    #[serde(default)]
    pub she: SheDef,
    #[serde(default)]
    pub scattering: ScatteringDef,
    #[serde(default)]
    pub nonlinear: NonlinearDef,
    #[serde(default)]
    pub linear: LinearDef,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            version: LATEST_VERSION,
            temperature_k: default_temperature_k(),
            carriers: CarriersDef::default(),
            poisson: PoissonDef::default(),
            she: SheDef::default(),
            scattering: ScatteringDef::default(),
            nonlinear: NonlinearDef::default(),
            linear: LinearDef::default(),
        }
    }
}

impl SimulationConfig {
    /// Lattice temperature.
    pub fn temperature(&self) -> Temperature {
        k(self.temperature_k)
    }

    pub fn carrier(&self, carrier: Carrier) -> &CarrierDef {
        match carrier {
            Carrier::Electron => &self.carriers.electrons,
            Carrier::Hole => &self.carriers.holes,
        }
    }

    pub fn carrier_mut(&mut self, carrier: Carrier) -> &mut CarrierDef {
        match carrier {
            Carrier::Electron => &mut self.carriers.electrons,
            Carrier::Hole => &mut self.carriers.holes,
        }
    }

    /// Equation solved for a carrier, or None if the carrier is disabled.
    pub fn equation_for(&self, carrier: Carrier) -> Option<EquationKind> {
        let def = self.carrier(carrier);
        def.enabled
            .then(|| EquationKind::for_carrier(carrier, def.equation))
    }

    /// Enabled equations in solve order: Poisson, electrons, holes.
    pub fn enabled_equations(&self) -> Vec<EquationKind> {
        let mut out = Vec::with_capacity(3);
        if self.poisson.enabled {
            out.push(EquationKind::Poisson);
        }
        out.extend(self.equation_for(Carrier::Electron));
        out.extend(self.equation_for(Carrier::Hole));
        out
    }

    /// Whether any enabled carrier uses SHE.
    pub fn uses_she(&self) -> bool {
        self.enabled_equations().iter().any(|e| e.is_she())
    }

    pub fn with_electrons(mut self, enabled: bool) -> Self {
        self.carriers.electrons.enabled = enabled;
        self
    }

    pub fn with_holes(mut self, enabled: bool) -> Self {
        self.carriers.holes.enabled = enabled;
        self
    }

    pub fn with_equation(mut self, carrier: Carrier, equation: CarrierEquation) -> Self {
        self.carrier_mut(carrier).equation = equation;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CarriersDef {
    #[serde(default)]
    pub electrons: CarrierDef,
    #[serde(default)]
    pub holes: CarrierDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CarrierDef {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub equation: CarrierEquation,
}

impl Default for CarrierDef {
    fn default() -> Self {
        Self {
            enabled: true,
            equation: CarrierEquation::Continuity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoissonDef {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for PoissonDef {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Spherical harmonics expansion options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SheDef {
    #[serde(default = "default_expansion_order")]
    pub max_expansion_order: u32,
    /// Spacing of the total-energy grid.
    #[serde(default = "default_energy_spacing_ev")]
    pub energy_spacing_ev: f64,
    /// Kinetic-energy range covered above the lowest band edge.
    #[serde(default = "default_energy_window_ev")]
    pub energy_window_ev: f64,
}

impl Default for SheDef {
    fn default() -> Self {
        Self {
            max_expansion_order: default_expansion_order(),
            energy_spacing_ev: default_energy_spacing_ev(),
            energy_window_ev: default_energy_window_ev(),
        }
    }
}

/// Scattering mechanisms included in the SHE model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScatteringDef {
    #[serde(default = "default_true")]
    pub acoustic_phonon: bool,
    #[serde(default = "default_true")]
    pub optical_phonon: bool,
    #[serde(default)]
    pub ionized_impurity: bool,
}

impl Default for ScatteringDef {
    fn default() -> Self {
        Self {
            acoustic_phonon: true,
            optical_phonon: true,
            ionized_impurity: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonlinearKind {
    #[default]
    Gummel,
    Newton,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NonlinearDef {
    #[serde(default)]
    pub kind: NonlinearKind,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Damping factor in (0, 1].
    #[serde(default = "default_damping")]
    pub damping: f64,
    /// Convergence threshold on the max relative update.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Consecutive growing updates before the solve is declared diverged
    /// (0 disables the growth check; non-finite updates always diverge).
    #[serde(default = "default_divergence_window")]
    pub divergence_window: usize,
    /// Optional wall-clock budget, checked between iterations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_budget_s: Option<f64>,
}

impl Default for NonlinearDef {
    fn default() -> Self {
        Self {
            kind: NonlinearKind::Gummel,
            max_iterations: default_max_iterations(),
            damping: default_damping(),
            tolerance: default_tolerance(),
            divergence_window: default_divergence_window(),
            time_budget_s: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearKind {
    #[default]
    DenseLu,
    #[serde(rename = "bicgstab")]
    BiCgStab,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinearDef {
    #[serde(default)]
    pub kind: LinearKind,
    #[serde(default = "default_linear_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_linear_tolerance")]
    pub tolerance: f64,
}

impl Default for LinearDef {
    fn default() -> Self {
        Self {
            kind: LinearKind::DenseLu,
            max_iterations: default_linear_max_iterations(),
            tolerance: default_linear_tolerance(),
        }
    }
}

fn default_version() -> u32 {
    LATEST_VERSION
}

fn default_temperature_k() -> f64 {
    300.0
}

fn default_true() -> bool {
    true
}

fn default_expansion_order() -> u32 {
    1
}

fn default_energy_spacing_ev() -> f64 {
    0.031
}

fn default_energy_window_ev() -> f64 {
    0.8
}

fn default_max_iterations() -> usize {
    50
}

fn default_damping() -> f64 {
    1.0
}

fn default_tolerance() -> f64 {
    1e-8
}

fn default_divergence_window() -> usize {
    5
}

fn default_linear_max_iterations() -> usize {
    1000
}

fn default_linear_tolerance() -> f64 {
    1e-12
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equation_order_is_fixed() {
        let cfg = SimulationConfig::default();
        assert_eq!(
            cfg.enabled_equations(),
            vec![
                EquationKind::Poisson,
                EquationKind::ElectronContinuity,
                EquationKind::HoleContinuity
            ]
        );

        let cfg = SimulationConfig::default()
            .with_holes(false)
            .with_equation(Carrier::Electron, CarrierEquation::She);
        assert_eq!(
            cfg.enabled_equations(),
            vec![EquationKind::Poisson, EquationKind::ElectronShe]
        );
        assert!(cfg.uses_she());
    }

    #[test]
    fn equations_map_to_unknowns() {
        assert_eq!(EquationKind::Poisson.unknown(), Quantity::Potential);
        assert_eq!(EquationKind::HoleShe.unknown(), Quantity::HoleDistribution);
        assert_eq!(EquationKind::HoleShe.carrier(), Some(Carrier::Hole));
        assert_eq!(EquationKind::Poisson.carrier(), None);
    }

    #[test]
    fn temperature_as_uom() {
        let cfg = SimulationConfig::default();
        let t = cfg.temperature().get::<uom::si::thermodynamic_temperature::kelvin>();
        assert_eq!(t, 300.0);
    }
}
