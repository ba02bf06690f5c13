//! Total-energy grid for the SHE unknowns.
//!
//! Level `k` sits at `H_k = H_min + (k + 1/2) ΔH` (eV). The kinetic energy of
//! a carrier in a cell with band edge `e` is `H_k - e`; levels where this is
//! not positive carry no carriers.

use crate::error::{DeviceError, DeviceResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyGrid {
    lowest: f64,
    spacing: f64,
    levels: usize,
}

impl EnergyGrid {
    /// A grid whose levels span every band edge plus `window` of kinetic
    /// energy above the highest one.
    pub fn fit<I>(band_edges: I, spacing: f64, window: f64) -> DeviceResult<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(DeviceError::InvalidParameter {
                what: "energy spacing",
                value: spacing,
            });
        }
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for e in band_edges {
            if !e.is_finite() {
                return Err(DeviceError::InvalidParameter {
                    what: "band edge",
                    value: e,
                });
            }
            lo = lo.min(e);
            hi = hi.max(e);
        }
        if lo > hi {
            return Err(DeviceError::MissingField {
                what: "band edges for the energy grid".to_string(),
            });
        }
        let levels = ((hi - lo + window) / spacing).ceil().max(1.0) as usize;
        Ok(Self {
            lowest: lo + 0.5 * spacing,
            spacing,
            levels,
        })
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Total energy of level `k`.
    pub fn total(&self, k: usize) -> f64 {
        self.lowest + k as f64 * self.spacing
    }

    /// Kinetic energy of level `k` above band edge `edge`.
    pub fn kinetic(&self, k: usize, edge: f64) -> f64 {
        self.total(k) - edge
    }

    /// Number of levels closest to an energy step of `energy` eV (at least one).
    pub fn steps(&self, energy: f64) -> usize {
        (energy / self.spacing).round().max(1.0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_covers_edges_and_window() {
        let g = EnergyGrid::fit([-0.5, 0.25, 0.0], 0.25, 1.0).unwrap();
        assert_eq!(g.levels(), 7);
        assert!((g.total(0) - (-0.375)).abs() < 1e-12);
        // every cell keeps at least `window` of kinetic energy on the grid
        let top = g.total(g.levels() - 1) + 0.5 * g.spacing();
        assert!(top - 0.25 >= 1.0 - 1e-12);
        assert!(g.kinetic(0, -0.5) > 0.0);
        assert!(g.kinetic(0, 0.25) < 0.0);
    }

    #[test]
    fn phonon_steps_round_to_nearest_level() {
        let g = EnergyGrid::fit([0.0], 0.031, 0.8).unwrap();
        assert_eq!(g.steps(0.063), 2);
        assert_eq!(g.steps(0.001), 1);
    }

    #[test]
    fn bad_inputs() {
        assert!(EnergyGrid::fit([0.0], 0.0, 1.0).is_err());
        assert!(EnergyGrid::fit(std::iter::empty(), 0.1, 1.0).is_err());
        assert!(EnergyGrid::fit([f64::NAN], 0.1, 1.0).is_err());
    }
}
