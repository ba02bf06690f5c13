//! First-order spherical harmonics expansion of the Boltzmann equation.
//!
//! The unknown is the isotropic part `f` of the distribution on a fixed grid
//! of total energies `H_k`, stored cell-major (`cell * levels + k`). On each
//! level the projected transport is a diffusion in space with coefficient
//! `Z(ε) D(ε)`, `D = v² τ_m / 3`; optical phonons couple levels `k ± m`.
//! Kinetic energy is `ε = H_k - e` with band edge `e = s ψ` (`s` the charge
//! sign), so a rising potential lowers the electron band edge.

use nalgebra::DVector;
use sf_config::Carrier;
use sf_core::units::constants::{M0, Q};
use sf_solver::{Row, SolverResult};

use crate::assembler::DeviceAssembler;
use crate::energy::EnergyGrid;
use crate::material::{Material, MaterialKind};
use crate::physics::{dos_prefactor, harmonic_mean, velocity_squared};

/// Lower bound (eV) on the energy in the ionized-impurity rate.
const IMPURITY_ENERGY_FLOOR: f64 = 1.0e-3;

/// Optical phonon coupling resolved on the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Optical {
    steps: usize,
    energy: f64,
    occupation: f64,
}

pub(crate) struct SheModel<'a> {
    asm: &'a DeviceAssembler,
    carrier: Carrier,
    grid: EnergyGrid,
}

impl<'a> SheModel<'a> {
    pub fn new(asm: &'a DeviceAssembler, carrier: Carrier, grid: EnergyGrid) -> Self {
        Self { asm, carrier, grid }
    }

    pub fn levels(&self) -> usize {
        self.grid.levels()
    }

    fn band_edge(&self, psi: f64) -> f64 {
        self.carrier.charge_sign() * psi
    }

    /// Thermal energy in eV.
    fn kt(&self) -> f64 {
        self.asm.vt
    }

    /// Material whose band structure describes carriers in `cell`; contacts
    /// use the semiconductor they touch.
    fn band_material(&self, cell: usize) -> &Material {
        match self.asm.contacts[cell] {
            Some(contact) => &self.asm.materials[contact.reference],
            None => self.asm.material(cell),
        }
    }

    fn dos(&self, cell: usize, energy: f64) -> f64 {
        if energy <= 0.0 {
            return 0.0;
        }
        let mass = self.band_material(cell).carrier(self.carrier).effective_mass;
        dos_prefactor(mass) * energy.sqrt()
    }

    fn optical(&self, material: &Material) -> Option<Optical> {
        if !self.asm.config.scattering.optical_phonon || material.scattering.optical == 0.0 {
            return None;
        }
        let steps = self.grid.steps(material.scattering.optical_phonon_ev);
        let energy = steps as f64 * self.grid.spacing();
        Some(Optical {
            steps,
            energy,
            occupation: 1.0 / (energy / self.kt()).exp_m1(),
        })
    }

    /// Momentum relaxation rate (1/s) at kinetic energy `energy`.
    fn momentum_rate(&self, cell: usize, energy: f64) -> f64 {
        let material = self.band_material(cell);
        let s = &material.scattering;
        let toggles = &self.asm.config.scattering;
        let mut rate = 0.0;
        if toggles.acoustic_phonon {
            rate += s.acoustic * energy.sqrt();
        }
        if let Some(op) = self.optical(material) {
            rate += s.optical
                * (op.occupation * (energy + op.energy).sqrt()
                    + (op.occupation + 1.0) * (energy - op.energy).max(0.0).sqrt());
        }
        if toggles.ionized_impurity {
            let density = self.asm.impurity_density(cell) / s.impurity_reference_density;
            let e = energy.max(IMPURITY_ENERGY_FLOOR);
            rate += s.impurity * density * (s.impurity_reference_ev / e).powf(1.5);
        }
        if rate > 0.0 {
            rate
        } else {
            // no mechanism enabled: relaxation time from the low-field mobility
            let params = material.carrier(self.carrier);
            Q / (params.mobility * params.effective_mass * M0)
        }
    }

    /// `Z(ε) D(ε)` in `cell`.
    fn transport(&self, cell: usize, energy: f64) -> f64 {
        let mass = self.band_material(cell).carrier(self.carrier).effective_mass;
        let diffusivity = velocity_squared(mass, energy) / (3.0 * self.momentum_rate(cell, energy));
        self.dos(cell, energy) * diffusivity
    }

    fn facet_transport(&self, a: usize, b: usize, energy: f64) -> f64 {
        match (self.asm.kind(a), self.asm.kind(b)) {
            (MaterialKind::Semiconductor, MaterialKind::Semiconductor) => {
                harmonic_mean(self.transport(a, energy), self.transport(b, energy))
            }
            (MaterialKind::Metal, MaterialKind::Semiconductor) => self.transport(b, energy),
            _ => self.transport(a, energy),
        }
    }

    /// Maxwellian over the levels of `cell` normalized so that the discrete
    /// density equals `density`.
    pub fn maxwellian(&self, cell: usize, psi: f64, density: f64) -> Vec<f64> {
        let edge = self.band_edge(psi);
        let mut f = vec![0.0; self.levels()];
        let mut norm = 0.0;
        for (k, slot) in f.iter_mut().enumerate() {
            let energy = self.grid.kinetic(k, edge);
            if energy > 0.0 {
                *slot = (-energy / self.kt()).exp();
                norm += self.dos(cell, energy) * *slot * self.grid.spacing();
            }
        }
        if norm > 0.0 {
            let scale = density / norm;
            f.iter_mut().for_each(|v| *v *= scale);
        }
        f
    }

    pub fn maxwellian_field(&self, psi: &DVector<f64>, density: &DVector<f64>) -> DVector<f64> {
        let levels = self.levels();
        let mut out = DVector::zeros(psi.len() * levels);
        for cell in 0..psi.len() {
            if self.asm.kind(cell) == MaterialKind::Insulator {
                continue;
            }
            let f = self.maxwellian(cell, psi[cell], density[cell]);
            out.rows_mut(cell * levels, levels)
                .copy_from_slice(&f);
        }
        out
    }

    /// `n = Σ_k Z(ε_k) f_k ΔH` in `cell`.
    pub fn density(&self, cell: usize, psi: f64, f: &[f64]) -> f64 {
        if self.asm.kind(cell) == MaterialKind::Insulator {
            return 0.0;
        }
        let edge = self.band_edge(psi);
        f.iter()
            .enumerate()
            .map(|(k, v)| self.dos(cell, self.grid.kinetic(k, edge)) * v)
            .sum::<f64>()
            * self.grid.spacing()
    }

    pub fn density_field(&self, psi: &DVector<f64>, f: &DVector<f64>) -> DVector<f64> {
        let levels = self.levels();
        DVector::from_fn(psi.len(), |cell, _| {
            let start = cell * levels;
            self.density(cell, psi[cell], &f.as_slice()[start..start + levels])
        })
    }

    /// Particle flux density from `a` to `b` summed over all levels.
    pub fn facet_flux(&self, a: usize, b: usize, distance: f64, psi: &DVector<f64>, f: &DVector<f64>) -> f64 {
        let levels = self.levels();
        let (ea, eb) = (self.band_edge(psi[a]), self.band_edge(psi[b]));
        let mut flux = 0.0;
        for k in 0..levels {
            let energy = self.grid.kinetic(k, ea).min(self.grid.kinetic(k, eb));
            if energy <= 0.0 {
                continue;
            }
            let w = self.facet_transport(a, b, energy);
            flux += w * (f[a * levels + k] - f[b * levels + k]);
        }
        flux * self.grid.spacing() / distance
    }

    /// Rows of all levels of `cell`.
    pub fn rows(&self, cell: usize, psi: &DVector<f64>) -> SolverResult<Vec<Row>> {
        let levels = self.levels();
        let base = cell * levels;
        match self.asm.kind(cell) {
            MaterialKind::Insulator => Ok((0..levels).map(|k| Row::fixed(base + k, 0.0)).collect()),
            MaterialKind::Metal => {
                let density = self.asm.contact(cell)?.density(self.carrier);
                Ok(self
                    .maxwellian(cell, psi[cell], density)
                    .into_iter()
                    .enumerate()
                    .map(|(k, v)| Row::fixed(base + k, v))
                    .collect())
            }
            MaterialKind::Semiconductor => Ok((0..levels)
                .map(|k| self.semiconductor_row(cell, k, psi))
                .collect()),
        }
    }

    fn semiconductor_row(&self, cell: usize, k: usize, psi: &DVector<f64>) -> Row {
        let levels = self.levels();
        let index = cell * levels + k;
        let energy = self.grid.kinetic(k, self.band_edge(psi[cell]));
        if energy <= 0.0 {
            return Row::fixed(index, 0.0);
        }

        let mut row = Row::new(index);
        let mut diagonal = 0.0;
        for nb in &self.asm.coupling.neighbors[cell] {
            if self.asm.kind(nb.cell) == MaterialKind::Insulator {
                continue;
            }
            let other = self.grid.kinetic(k, self.band_edge(psi[nb.cell]));
            let facet_energy = energy.min(other);
            if facet_energy <= 0.0 {
                continue;
            }
            let w = nb.kappa * self.facet_transport(cell, nb.cell, facet_energy);
            diagonal += w;
            row.add(nb.cell * levels + k, -w);
        }

        let material = self.asm.material(cell);
        if let Some(op) = self.optical(material) {
            let scale = self.asm.coupling.volumes[cell] * self.dos(cell, energy) * material.scattering.optical;
            let n = op.occupation;
            // absorption to k + m, balanced by emission from k + m
            if k + op.steps < levels {
                let g = (energy + op.energy).sqrt();
                diagonal += scale * n * g;
                row.add(index + op.steps, -scale * (n + 1.0) * g);
            }
            // emission to k - m, balanced by absorption from k - m
            if k >= op.steps && energy > op.energy {
                let g = (energy - op.energy).sqrt();
                diagonal += scale * (n + 1.0) * g;
                row.add(index - op.steps, -scale * n * g);
            }
        }

        if diagonal == 0.0 {
            // level not connected to anything: no carriers reach it
            return Row::fixed(index, 0.0);
        }
        row.add(index, diagonal);
        row
    }
}
