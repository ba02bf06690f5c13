//! Poisson rows.
//!
//! `Σ_f ε_f κ_f (ψ_i - ψ_j) = q V_i (p - n + N_D - N_A)` with the carrier
//! densities linearized around the current potential, so that
//! `A(ψ) ψ - b(ψ)` is the nonlinear residual.

use nalgebra::DVector;
use sf_core::units::constants::{EPS0, Q};
use sf_solver::Row;

use crate::assembler::{Densities, DeviceAssembler};
use crate::material::MaterialKind;
use crate::physics::harmonic_mean;

pub(crate) fn row(asm: &DeviceAssembler, cell: usize, psi: &DVector<f64>, densities: &Densities) -> Row {
    let kind = asm.kind(cell);
    if kind == MaterialKind::Metal {
        let value = asm.contacts[cell].map_or(psi[cell], |c| c.potential);
        return Row::fixed(cell, value);
    }

    let mut row = Row::new(cell);
    let eps_i = asm.material(cell).relative_permittivity * EPS0;
    let mut diagonal = 0.0;
    for nb in &asm.coupling.neighbors[cell] {
        // a contact takes the permittivity of the material it bounds
        let eps_j = match asm.kind(nb.cell) {
            MaterialKind::Metal => eps_i,
            _ => asm.material(nb.cell).relative_permittivity * EPS0,
        };
        let c = harmonic_mean(eps_i, eps_j) * nb.kappa;
        diagonal += c;
        row.add(nb.cell, -c);
    }

    if kind == MaterialKind::Semiconductor {
        let volume = asm.coupling.volumes[cell];
        let n = densities.electrons[cell];
        let p = densities.holes[cell];
        let linear = Q * volume * (n + p) / asm.vt;
        diagonal += linear;
        row.rhs = Q * volume * (p - n + asm.net_doping(cell)) + linear * psi[cell];
    }
    row.add(cell, diagonal);
    row
}
