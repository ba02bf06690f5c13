//! Mesh-specific error types.

use sf_core::{CellId, FacetId, Id, SfError, VertexId};

use crate::mesh::CellShape;

pub type MeshResult<T> = Result<T, MeshError>;

/// Mesh construction and validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// Geometric dimension outside 1..=3.
    UnsupportedGeometricDimension { dim: usize },

    /// A vertex was given with the wrong number of coordinates.
    VertexDimensionMismatch {
        vertex: VertexId,
        expected: usize,
        actual: usize,
    },

    /// A cell refers to a vertex that doesn't exist.
    InvalidVertexRef { cell: CellId, vertex: VertexId },

    /// A cell has the wrong number of vertices for its shape.
    WrongVertexCount {
        cell: CellId,
        shape: CellShape,
        count: usize,
    },

    /// A cell lists the same vertex twice.
    DuplicateVertex { cell: CellId },

    /// Cells of different topological dimension in one mesh.
    MixedCellDimension {
        cell: CellId,
        expected: usize,
        actual: usize,
    },

    /// Cell dimension larger than the embedding space.
    CellExceedsGeometry { cell_dim: usize, geo_dim: usize },

    /// A facet is shared by more than two cells.
    NonManifoldFacet { facet: FacetId, cells: usize },

    /// A cell has (numerically) zero measure.
    DegenerateCell { cell: CellId },

    /// Cell/facet adjacency is inconsistent.
    InconsistentAdjacency { cell: CellId, facet: FacetId },

    /// The mesh has no cells.
    Empty,

    /// More vertices, cells or facets than a `u32` id can number.
    TooManyEntities { what: &'static str, count: usize },
}

impl std::fmt::Display for MeshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeshError::UnsupportedGeometricDimension { dim } => {
                write!(f, "Geometric dimension {} is not supported (expected 1..=3)", dim)
            }
            MeshError::VertexDimensionMismatch {
                vertex,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Vertex {} has {} coordinates (expected {})",
                    vertex, actual, expected
                )
            }
            MeshError::InvalidVertexRef { cell, vertex } => {
                write!(f, "Cell {} refers to non-existent vertex {}", cell, vertex)
            }
            MeshError::WrongVertexCount { cell, shape, count } => {
                write!(
                    f,
                    "Cell {} of shape {:?} has {} vertices (expected {})",
                    cell,
                    shape,
                    count,
                    shape.vertex_count()
                )
            }
            MeshError::DuplicateVertex { cell } => {
                write!(f, "Cell {} lists a vertex more than once", cell)
            }
            MeshError::MixedCellDimension {
                cell,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Cell {} has dimension {} but the mesh has dimension {}",
                    cell, actual, expected
                )
            }
            MeshError::CellExceedsGeometry { cell_dim, geo_dim } => {
                write!(
                    f,
                    "Cell dimension {} exceeds geometric dimension {}",
                    cell_dim, geo_dim
                )
            }
            MeshError::NonManifoldFacet { facet, cells } => {
                write!(f, "Facet {} is shared by {} cells (at most 2 allowed)", facet, cells)
            }
            MeshError::DegenerateCell { cell } => {
                write!(f, "Cell {} has zero measure", cell)
            }
            MeshError::InconsistentAdjacency { cell, facet } => {
                write!(
                    f,
                    "Facet {} in cell {}'s boundary but the facet doesn't reference that cell",
                    facet, cell
                )
            }
            MeshError::Empty => write!(f, "Mesh has no cells"),
            MeshError::TooManyEntities { what, count } => {
                write!(
                    f,
                    "Mesh has {} {} but ids can number at most {}",
                    count,
                    what,
                    Id::MAX_INDEX + 1
                )
            }
        }
    }
}

impl std::error::Error for MeshError {}

impl From<MeshError> for SfError {
    fn from(err: MeshError) -> Self {
        SfError::Invariant {
            what: err.to_string(),
        }
    }
}
