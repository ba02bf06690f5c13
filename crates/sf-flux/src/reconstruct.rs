//! Dual-box flux reconstruction.
//!
//! Given scalar fluxes normal to each facet, find the cell vector `x` whose
//! projections onto the cell's outward normals best match them:
//! `(Σ n nᵀ) x = Σ n flux`.
//!
//! Facet fluxes are oriented from the facet's first coboundary cell (its
//! owner). Cells on the other side see the negated value.

use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use sf_core::timing::{self, Stage};
use sf_core::{CellId, FacetId};
use sf_mesh::Topology;

use crate::dense::solve_dense;
use crate::error::{FluxError, FluxResult};
use crate::normal::{Dimensionality, outer_normal};

/// Read access to scalar normal fluxes on facets.
pub trait FacetFluxSource {
    /// Flux through `facet`, oriented from its first coboundary cell.
    fn facet_flux(&self, facet: FacetId) -> FluxResult<f64>;
}

/// Write access for reconstructed cell vectors.
pub trait CellVectorSink {
    fn set_cell_vector(&mut self, cell: CellId, value: DVector<f64>);
}

/// Plain per-facet values, indexed by facet index.
impl FacetFluxSource for [f64] {
    fn facet_flux(&self, facet: FacetId) -> FluxResult<f64> {
        self.get(facet.idx())
            .copied()
            .ok_or_else(|| FluxError::Accessor {
                facet,
                what: format!("no value (have {})", self.len()),
            })
    }
}

impl FacetFluxSource for Vec<f64> {
    fn facet_flux(&self, facet: FacetId) -> FluxResult<f64> {
        self.as_slice().facet_flux(facet)
    }
}

impl CellVectorSink for BTreeMap<CellId, DVector<f64>> {
    fn set_cell_vector(&mut self, cell: CellId, value: DVector<f64>) {
        self.insert(cell, value);
    }
}

/// Reconstruct the flux vector of a single cell.
pub fn reconstruct_cell_flux<T, S>(mesh: &T, cell: CellId, source: &S) -> FluxResult<DVector<f64>>
where
    T: Topology + ?Sized,
    S: FacetFluxSource + ?Sized,
{
    let d = Dimensionality::of(mesh)?.value();
    let mut m = DMatrix::<f64>::zeros(d, d);
    let mut b = DVector::<f64>::zeros(d);

    for &facet in mesh.boundary_elements(cell) {
        let mut flux = source.facet_flux(facet)?;
        if !flux.is_finite() {
            return Err(FluxError::NonFinite { facet, value: flux });
        }
        let n = outer_normal(mesh, cell, facet)?;

        if mesh.coboundary_elements(facet).first() != Some(&cell) {
            flux = -flux;
        }

        m += &n * n.transpose();
        b += &n * flux;
    }

    solve_dense(&m, &b).map_err(|e| match e {
        FluxError::SingularSystem { .. } => FluxError::SingularSystem { cell: Some(cell) },
        other => other,
    })
}

/// Reconstruct the given cells in parallel and write them into `sink`.
///
/// Each cell is written exactly once, in the order given. If any cell fails,
/// the first failure (in that order) is returned and nothing is written.
pub fn reconstruct_cells<T, S, K>(
    mesh: &T,
    cells: &[CellId],
    source: &S,
    sink: &mut K,
) -> FluxResult<()>
where
    T: Topology + Sync + ?Sized,
    S: FacetFluxSource + Sync + ?Sized,
    K: CellVectorSink + ?Sized,
{
    let values = reconstruct_many(mesh, cells, source)?;
    for (&cell, value) in cells.iter().zip(values) {
        sink.set_cell_vector(cell, value);
    }
    Ok(())
}

/// Reconstruct every cell of the mesh into `sink`.
pub fn reconstruct_all<T, S, K>(mesh: &T, source: &S, sink: &mut K) -> FluxResult<()>
where
    T: Topology + Sync + ?Sized,
    S: FacetFluxSource + Sync + ?Sized,
    K: CellVectorSink + ?Sized,
{
    let cells: Vec<CellId> = (0..mesh.cell_count()).map(CellId::from_usize).collect();
    reconstruct_cells(mesh, &cells, source, sink)
}

/// Reconstruct every cell and return the vectors in cell order.
pub fn reconstruct_all_to_vec<T, S>(mesh: &T, source: &S) -> FluxResult<Vec<DVector<f64>>>
where
    T: Topology + Sync + ?Sized,
    S: FacetFluxSource + Sync + ?Sized,
{
    let cells: Vec<CellId> = (0..mesh.cell_count()).map(CellId::from_usize).collect();
    reconstruct_many(mesh, &cells, source)
}

fn reconstruct_many<T, S>(mesh: &T, cells: &[CellId], source: &S) -> FluxResult<Vec<DVector<f64>>>
where
    T: Topology + Sync + ?Sized,
    S: FacetFluxSource + Sync + ?Sized,
{
    let results: Vec<FluxResult<DVector<f64>>> = timing::timed(Stage::Reconstruction, || {
        cells
            .par_iter()
            .map(|&cell| reconstruct_cell_flux(mesh, cell, source))
            .collect()
    });

    let values: FluxResult<Vec<_>> = results.into_iter().collect();
    if let Err(e) = &values {
        tracing::debug!(error = %e, "flux reconstruction failed");
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::RegionId;
    use sf_mesh::structured::line_mesh;

    #[test]
    fn uniform_flux_in_one_dimension() {
        let mesh = line_mesh(0.0, 3.0, 3, |_| RegionId(0)).unwrap();
        // facet 0 is owned by cell 0, whose outward normal there is -x
        let fluxes = vec![-2.5, 2.5, 2.5, 2.5];
        let out = reconstruct_all_to_vec(&mesh, &fluxes).unwrap();
        assert_eq!(out.len(), 3);
        for v in out {
            assert_eq!(v.as_slice(), &[2.5]);
        }
    }

    #[test]
    fn missing_facet_value_fails_whole_cell() {
        let mesh = line_mesh(0.0, 2.0, 2, |_| RegionId(0)).unwrap();
        let fluxes = vec![1.0, 1.0];
        let c1 = CellId::from_index(1);
        assert!(matches!(
            reconstruct_cell_flux(&mesh, c1, &fluxes),
            Err(FluxError::Accessor { .. })
        ));

        let mut sink: BTreeMap<CellId, DVector<f64>> = BTreeMap::new();
        assert!(reconstruct_all(&mesh, &fluxes, &mut sink).is_err());
        assert!(sink.is_empty());
    }

    #[test]
    fn non_finite_flux_rejected() {
        let mesh = line_mesh(0.0, 1.0, 1, |_| RegionId(0)).unwrap();
        let fluxes = vec![1.0, f64::NAN];
        let err = reconstruct_cell_flux(&mesh, CellId::from_index(0), &fluxes).unwrap_err();
        assert!(matches!(err, FluxError::NonFinite { .. }));
    }

    #[test]
    fn region_subset_writes_only_requested_cells() {
        let mesh = line_mesh(0.0, 4.0, 4, |p| RegionId(if p[0] < 2.0 { 1 } else { 2 })).unwrap();
        let fluxes: Vec<f64> = (0..5).map(|i| i as f64).collect();
        let cells = mesh.cells_in_region(RegionId(2));
        let mut sink: BTreeMap<CellId, DVector<f64>> = BTreeMap::new();
        reconstruct_cells(&mesh, &cells, &fluxes, &mut sink).unwrap();
        assert_eq!(sink.keys().copied().collect::<Vec<_>>(), cells);
        // cell 2 spans facets 2 and 3
        assert_eq!(sink[&cells[0]].as_slice(), &[2.5]);
    }
}
