//! Drift-diffusion continuity rows.
//!
//! Particle balance `Σ_f |f| Γ_f + V_i R = 0` with Scharfetter–Gummel facet
//! fluxes and SRH recombination. Facets towards insulators carry no flux.

use nalgebra::DVector;
use sf_config::Carrier;
use sf_solver::{Row, SolverResult};

use crate::assembler::{Densities, DeviceAssembler};
use crate::material::MaterialKind;
use crate::physics::{harmonic_mean, sg_weights, srh_split};

/// Diffusivity `μ V_T` of `carrier` in the semiconductor side of a facet.
pub(crate) fn facet_diffusivity(asm: &DeviceAssembler, carrier: Carrier, a: usize, b: usize) -> f64 {
    let d = |cell: usize| asm.material(cell).carrier(carrier).mobility * asm.vt;
    match (asm.kind(a), asm.kind(b)) {
        (MaterialKind::Semiconductor, MaterialKind::Semiconductor) => harmonic_mean(d(a), d(b)),
        (MaterialKind::Semiconductor, MaterialKind::Metal) => d(a),
        (MaterialKind::Metal, MaterialKind::Semiconductor) => d(b),
        _ => 0.0,
    }
}

pub(crate) fn row(
    asm: &DeviceAssembler,
    carrier: Carrier,
    cell: usize,
    psi: &DVector<f64>,
    densities: &Densities,
) -> SolverResult<Row> {
    match asm.kind(cell) {
        MaterialKind::Insulator => return Ok(Row::fixed(cell, 0.0)),
        MaterialKind::Metal => return Ok(Row::fixed(cell, asm.contact(cell)?.density(carrier))),
        MaterialKind::Semiconductor => {}
    }

    let sign = carrier.charge_sign();
    let mut row = Row::new(cell);
    let mut diagonal = 0.0;
    for nb in &asm.coupling.neighbors[cell] {
        let diffusivity = facet_diffusivity(asm, carrier, cell, nb.cell);
        if diffusivity == 0.0 {
            continue;
        }
        let (own, other) = sg_weights(sign, psi[nb.cell] - psi[cell], asm.vt);
        let c = diffusivity * nb.kappa;
        diagonal += c * own;
        row.add(nb.cell, -c * other);
    }

    let material = asm.material(cell);
    let n = densities.electrons[cell];
    let p = densities.holes[cell];
    let partner = match carrier {
        Carrier::Electron => p,
        Carrier::Hole => n,
    };
    let srh = srh_split(
        n,
        p,
        material.intrinsic_density,
        material.electrons.lifetime,
        material.holes.lifetime,
        partner,
    );
    let volume = asm.coupling.volumes[cell];
    diagonal += volume * srh.coefficient;
    row.rhs = volume * srh.source;

    row.add(cell, diagonal);
    Ok(row)
}
