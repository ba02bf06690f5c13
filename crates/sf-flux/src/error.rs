use sf_core::{CellId, FacetId};
use thiserror::Error;

pub type FluxResult<T> = Result<T, FluxError>;

/// Errors raised by normal estimation and flux reconstruction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluxError {
    #[error("Unsupported dimensionality: cell dimension {cell_dim} in geometric dimension {geo_dim}")]
    UnsupportedDimension { cell_dim: usize, geo_dim: usize },

    #[error("Singular local system{}", .cell.map(|c| format!(" in cell {c}")).unwrap_or_default())]
    SingularSystem { cell: Option<CellId> },

    #[error("Facet {facet} is not on the boundary of cell {cell}")]
    FacetNotOnCell { cell: CellId, facet: FacetId },

    #[error("Facet {facet} is degenerate (zero-length normal)")]
    DegenerateFacet { facet: FacetId },

    #[error("Non-finite flux {value} on facet {facet}")]
    NonFinite { facet: FacetId, value: f64 },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Flux source failed on facet {facet}: {what}")]
    Accessor { facet: FacetId, what: String },
}
