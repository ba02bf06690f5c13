//! sf-flux: facet normals and dual-box flux reconstruction.
//!
//! Scalar normal fluxes are only known on facets. This crate turns them into
//! a vector per cell by least-squares projection onto the cell's outward
//! facet normals (the "dual box" reconstruction):
//!
//! - `dense`: small dense solve with an explicit singularity check
//! - `normal`: outward unit facet normals, dispatched on mesh dimensionality
//! - `reconstruct`: per-cell and whole-mesh reconstruction

pub mod dense;
pub mod error;
pub mod normal;
pub mod reconstruct;

pub use dense::solve_dense;
pub use error::{FluxError, FluxResult};
pub use normal::{Dimensionality, outer_normal};
pub use reconstruct::{
    CellVectorSink, FacetFluxSource, reconstruct_all, reconstruct_all_to_vec, reconstruct_cell_flux,
    reconstruct_cells,
};
