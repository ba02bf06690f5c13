//! Outward unit facet normals.
//!
//! Dispatch is on the mesh's dimensionality: one strategy per supported
//! dimension, selected by `match`. Meshes whose cells do not fill the
//! embedding space (e.g. a surface mesh in 3-D) are rejected.

use nalgebra::DVector;
use sf_core::{CellId, FacetId};
use sf_mesh::Topology;
use sf_mesh::geometry::{self, Point};

use crate::error::{FluxError, FluxResult};

/// Supported mesh dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimensionality {
    One,
    Two,
    Three,
}

impl Dimensionality {
    /// Classify a mesh. Cell and geometric dimension must agree.
    pub fn of<T: Topology + ?Sized>(mesh: &T) -> FluxResult<Self> {
        let cell_dim = mesh.cell_dimension();
        let geo_dim = mesh.geometric_dimension();
        match (cell_dim, geo_dim) {
            (1, 1) => Ok(Dimensionality::One),
            (2, 2) => Ok(Dimensionality::Two),
            (3, 3) => Ok(Dimensionality::Three),
            _ => Err(FluxError::UnsupportedDimension { cell_dim, geo_dim }),
        }
    }

    /// Number of vector components.
    pub fn value(self) -> usize {
        match self {
            Dimensionality::One => 1,
            Dimensionality::Two => 2,
            Dimensionality::Three => 3,
        }
    }
}

/// Outward unit normal of `facet` as seen from `cell`.
pub fn outer_normal<T: Topology + ?Sized>(
    mesh: &T,
    cell: CellId,
    facet: FacetId,
) -> FluxResult<DVector<f64>> {
    let dim = Dimensionality::of(mesh)?;
    if !mesh.boundary_elements(cell).contains(&facet) {
        return Err(FluxError::FacetNotOnCell { cell, facet });
    }

    let cell_centroid = mesh.cell_centroid(cell);
    match dim {
        Dimensionality::One => {
            let facet_centroid = mesh.facet_centroid(facet);
            let sign = if cell_centroid[0] < facet_centroid[0] {
                1.0
            } else {
                -1.0
            };
            Ok(DVector::from_element(1, sign))
        }
        Dimensionality::Two => {
            let [v0, v1] = facet_points::<_, 2>(mesh, facet)?;
            let d = geometry::sub(v1, v0);
            let raw = [d[1], -d[0], 0.0];
            let n = orient_and_normalize(raw, cell_centroid, v0, facet)?;
            Ok(DVector::from_column_slice(&n[..2]))
        }
        Dimensionality::Three => {
            let [v0, v1, v2] = facet_points::<_, 3>(mesh, facet)?;
            let raw = geometry::cross(geometry::sub(v1, v0), geometry::sub(v2, v0));
            let n = orient_and_normalize(raw, cell_centroid, v0, facet)?;
            Ok(DVector::from_column_slice(&n))
        }
    }
}

/// First `N` vertex positions of a facet.
fn facet_points<T: Topology + ?Sized, const N: usize>(
    mesh: &T,
    facet: FacetId,
) -> FluxResult<[Point; N]> {
    let vertices = mesh.facet_vertices(facet);
    if vertices.len() < N {
        return Err(FluxError::DegenerateFacet { facet });
    }
    Ok(std::array::from_fn(|i| mesh.vertex_position(vertices[i])))
}

/// Flip `raw` away from the cell centroid and scale it to unit length.
fn orient_and_normalize(
    raw: Point,
    cell_centroid: Point,
    on_facet: Point,
    facet: FacetId,
) -> FluxResult<Point> {
    let len = geometry::norm(raw);
    if !(len.is_finite() && len > 0.0) {
        return Err(FluxError::DegenerateFacet { facet });
    }
    let inward = geometry::sub(cell_centroid, on_facet);
    let sign = if geometry::dot(inward, raw) > 0.0 { -1.0 } else { 1.0 };
    Ok(geometry::scale(raw, sign / len))
}
