//! Carrier statistics and the drift-diffusion building blocks.

use sf_core::bernoulli;
use sf_core::units::constants::{HBAR, M0, Q};

/// Charge-neutral equilibrium densities `(n0, p0)` for net doping `net`.
pub fn equilibrium_densities(ni: f64, net: f64) -> (f64, f64) {
    let root = (0.25 * net * net + ni * ni).sqrt();
    // Evaluate the majority carrier directly; the minority follows from n p = ni².
    if net >= 0.0 {
        let n0 = 0.5 * net + root;
        (n0, ni * ni / n0)
    } else {
        let p0 = -0.5 * net + root;
        (ni * ni / p0, p0)
    }
}

/// Potential of a charge-neutral region: `V_T asinh(C / (2 n_i))`.
pub fn builtin_potential(ni: f64, net: f64, vt: f64) -> f64 {
    vt * (0.5 * net / ni).asinh()
}

/// Boltzmann densities `(n, p)` at potential `psi`.
pub fn boltzmann_densities(ni: f64, psi: f64, vt: f64) -> (f64, f64) {
    (ni * (psi / vt).exp(), ni * (-psi / vt).exp())
}

/// Scharfetter–Gummel particle flux density from cell `a` to cell `b`.
///
/// `charge_sign` is -1 for electrons and +1 for holes; `d_psi` is
/// `psi_b - psi_a`. The result is `D/d [B(δ) c_a - B(-δ) c_b]` with
/// `δ = charge_sign * d_psi / V_T`, which vanishes at thermal equilibrium.
pub fn sg_flux(diffusivity: f64, distance: f64, charge_sign: f64, d_psi: f64, vt: f64, ca: f64, cb: f64) -> f64 {
    let (fa, fb) = sg_weights(charge_sign, d_psi, vt);
    diffusivity / distance * (fa * ca - fb * cb)
}

/// Coefficients `(B(δ), B(-δ))` of the SG flux.
pub fn sg_weights(charge_sign: f64, d_psi: f64, vt: f64) -> (f64, f64) {
    let delta = charge_sign * d_psi / vt;
    (bernoulli(delta), bernoulli(-delta))
}

/// Shockley–Read–Hall recombination split as `R = a·c - b`, linear in the
/// density `c` of the carrier being solved for, with the denominator frozen
/// at the current densities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SrhSplit {
    pub coefficient: f64,
    pub source: f64,
}

pub fn srh_split(n: f64, p: f64, ni: f64, tau_n: f64, tau_p: f64, other: f64) -> SrhSplit {
    let denominator = tau_p * (n + ni) + tau_n * (p + ni);
    SrhSplit {
        coefficient: other / denominator,
        source: ni * ni / denominator,
    }
}

/// `R = (np - ni²) / (τp (n + ni) + τn (p + ni))`.
pub fn srh_rate(n: f64, p: f64, ni: f64, tau_n: f64, tau_p: f64) -> f64 {
    (n * p - ni * ni) / (tau_p * (n + ni) + tau_n * (p + ni))
}

/// Harmonic mean, 0 if either side is 0.
pub fn harmonic_mean(a: f64, b: f64) -> f64 {
    if a <= 0.0 || b <= 0.0 {
        0.0
    } else {
        2.0 * a * b / (a + b)
    }
}

/// Prefactor of the parabolic density of states per eV and m³:
/// `Z(ε) = C sqrt(ε)` with `ε` in eV.
pub fn dos_prefactor(relative_mass: f64) -> f64 {
    let m = relative_mass * M0;
    (2.0 * m * Q / (HBAR * HBAR)).powf(1.5) / (2.0 * std::f64::consts::PI.powi(2))
}

/// Squared group velocity (m²/s²) at kinetic energy `energy_ev`.
pub fn velocity_squared(relative_mass: f64, energy_ev: f64) -> f64 {
    2.0 * Q * energy_ev.max(0.0) / (relative_mass * M0)
}
