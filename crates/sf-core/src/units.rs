// sf-core/src/units.rs

use uom::si::f64::{
    ElectricPotential as UomElectricPotential, Energy as UomEnergy, Length as UomLength,
    ThermodynamicTemperature as UomThermodynamicTemperature, Time as UomTime,
};

// Public canonical unit types (SI, f64)
pub type Potential = UomElectricPotential;
pub type Energy = UomEnergy;
pub type Length = UomLength;
pub type Temperature = UomThermodynamicTemperature;
pub type Time = UomTime;

#[inline]
pub fn volts(v: f64) -> Potential {
    use uom::si::electric_potential::volt;
    Potential::new::<volt>(v)
}

#[inline]
pub fn ev(v: f64) -> Energy {
    use uom::si::energy::electronvolt;
    Energy::new::<electronvolt>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

pub mod constants {
    use super::*;

    /// Elementary charge (C).
    pub const Q: f64 = 1.602_176_634e-19;
    /// Boltzmann constant (J/K).
    pub const KB: f64 = 1.380_649e-23;
    /// Vacuum permittivity (F/m).
    pub const EPS0: f64 = 8.854_187_812_8e-12;
    /// Reduced Planck constant (J s).
    pub const HBAR: f64 = 1.054_571_817e-34;
    /// Free electron mass (kg).
    pub const M0: f64 = 9.109_383_701_5e-31;

    /// Thermal voltage `kT/q`.
    #[inline]
    pub fn thermal_voltage(t: Temperature) -> Potential {
        volts(KB * t.value / Q)
    }

    /// Thermal energy `kT`.
    #[inline]
    pub fn thermal_energy(t: Temperature) -> Energy {
        use uom::si::energy::joule;
        Energy::new::<joule>(KB * t.value)
    }
}
