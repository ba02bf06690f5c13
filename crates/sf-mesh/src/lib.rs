//! sf-mesh: mesh topology layer for semiflux.
//!
//! Provides:
//! - Core mesh data structures (Vertex, Cell, Facet, Mesh)
//! - Incremental mesh builder that derives facets and validates topology
//! - The read-only `Topology` accessor consumed by discretization code
//! - Basic geometry (centroids, measures, small vector helpers)
//! - Structured grid helpers for tests and demos
//!
//! # Example
//!
//! ```
//! use sf_core::RegionId;
//! use sf_mesh::{CellShape, MeshBuilder, Topology};
//!
//! let mut builder = MeshBuilder::new(1);
//! let v0 = builder.add_vertex(&[0.0]);
//! let v1 = builder.add_vertex(&[1.0]);
//! let v2 = builder.add_vertex(&[2.0]);
//! builder.add_cell(CellShape::Line, &[v0, v1], RegionId(1));
//! builder.add_cell(CellShape::Line, &[v1, v2], RegionId(1));
//! let mesh = builder.build().unwrap();
//!
//! assert_eq!(mesh.cell_count(), 2);
//! assert_eq!(mesh.facet_count(), 3);
//! ```

pub mod builder;
pub mod error;
pub mod geometry;
pub mod mesh;
pub mod structured;
pub mod topology;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::MeshBuilder;
pub use error::{MeshError, MeshResult};
pub use mesh::{Cell, CellShape, Facet, Mesh, Vertex};
pub use topology::Topology;
