//! Material parameters.
//!
//! Parameters are plain inputs in SI units (densities in m⁻³, mobilities in
//! m²/(V s), lifetimes in s). Scattering strengths are in s⁻¹ eV^-1/2 so that
//! the rate of a mechanism is its strength times a square root of energy.

use sf_config::Carrier;

use crate::error::{DeviceError, DeviceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    Semiconductor,
    Insulator,
    /// Ohmic contact.
    Metal,
}

/// Per-carrier transport parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CarrierParams {
    /// Low-field mobility.
    pub mobility: f64,
    /// SRH lifetime.
    pub lifetime: f64,
    /// Effective mass relative to the free electron mass.
    pub effective_mass: f64,
}

/// Scattering strengths used by the SHE model.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatteringParams {
    pub acoustic: f64,
    pub optical: f64,
    /// Optical phonon energy in eV.
    pub optical_phonon_ev: f64,
    /// Rate (s⁻¹) at the reference impurity density and energy.
    pub impurity: f64,
    pub impurity_reference_density: f64,
    pub impurity_reference_ev: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub kind: MaterialKind,
    pub relative_permittivity: f64,
    pub intrinsic_density: f64,
    pub electrons: CarrierParams,
    pub holes: CarrierParams,
    pub scattering: ScatteringParams,
}

impl Material {
    /// Silicon at room temperature.
    pub fn silicon() -> Self {
        Self {
            name: "Si".to_string(),
            kind: MaterialKind::Semiconductor,
            relative_permittivity: 11.7,
            intrinsic_density: 1.0e16,
            electrons: CarrierParams {
                mobility: 0.14,
                lifetime: 1.0e-7,
                effective_mass: 0.26,
            },
            holes: CarrierParams {
                mobility: 0.045,
                lifetime: 1.0e-7,
                effective_mass: 0.39,
            },
            scattering: ScatteringParams {
                acoustic: 3.0e13,
                optical: 2.0e13,
                optical_phonon_ev: 0.063,
                impurity: 1.0e12,
                impurity_reference_density: 1.0e24,
                impurity_reference_ev: 0.025,
            },
        }
    }

    /// Silicon dioxide.
    pub fn oxide() -> Self {
        Self {
            name: "SiO2".to_string(),
            kind: MaterialKind::Insulator,
            relative_permittivity: 3.9,
            ..Self::silicon()
        }
    }

    /// An ohmic metal contact.
    pub fn metal() -> Self {
        Self {
            name: "metal".to_string(),
            kind: MaterialKind::Metal,
            relative_permittivity: 1.0,
            ..Self::silicon()
        }
    }

    pub fn is_semiconductor(&self) -> bool {
        self.kind == MaterialKind::Semiconductor
    }

    pub fn carrier(&self, carrier: Carrier) -> &CarrierParams {
        match carrier {
            Carrier::Electron => &self.electrons,
            Carrier::Hole => &self.holes,
        }
    }

    pub(crate) fn validate(&self) -> DeviceResult<()> {
        let positive = [
            ("relative_permittivity", self.relative_permittivity),
            ("intrinsic_density", self.intrinsic_density),
            ("electron mobility", self.electrons.mobility),
            ("electron lifetime", self.electrons.lifetime),
            ("electron effective_mass", self.electrons.effective_mass),
            ("hole mobility", self.holes.mobility),
            ("hole lifetime", self.holes.lifetime),
            ("hole effective_mass", self.holes.effective_mass),
            ("optical_phonon_ev", self.scattering.optical_phonon_ev),
            ("impurity_reference_density", self.scattering.impurity_reference_density),
            ("impurity_reference_ev", self.scattering.impurity_reference_ev),
        ];
        for (what, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(DeviceError::InvalidParameter { what, value });
            }
        }
        let non_negative = [
            ("acoustic strength", self.scattering.acoustic),
            ("optical strength", self.scattering.optical),
            ("impurity strength", self.scattering.impurity),
        ];
        for (what, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(DeviceError::InvalidParameter { what, value });
            }
        }
        Ok(())
    }
}
