//! Read-only topology accessor.
//!
//! Discretization and post-processing code is written against this trait
//! rather than against `Mesh` directly, so alternative mesh backends (or test
//! doubles with a different facet ownership) can be plugged in.

use sf_core::{CellId, FacetId, VertexId};

use crate::mesh::Mesh;

pub trait Topology {
    /// Topological dimension of the cells.
    fn cell_dimension(&self) -> usize;

    /// Dimension of the embedding space.
    fn geometric_dimension(&self) -> usize;

    fn cell_count(&self) -> usize;

    fn facet_count(&self) -> usize;

    /// Facets bounding `cell`, in local facet order. Empty for unknown IDs.
    fn boundary_elements(&self, cell: CellId) -> &[FacetId];

    /// Cells sharing `facet` (1 on the boundary, 2 inside). The first entry
    /// defines the global orientation of facet quantities. Empty for unknown IDs.
    fn coboundary_elements(&self, facet: FacetId) -> &[CellId];

    fn cell_centroid(&self, cell: CellId) -> [f64; 3];

    fn facet_centroid(&self, facet: FacetId) -> [f64; 3];

    fn facet_vertices(&self, facet: FacetId) -> &[VertexId];

    fn vertex_position(&self, vertex: VertexId) -> [f64; 3];
}

impl Topology for Mesh {
    fn cell_dimension(&self) -> usize {
        self.cell_dimension
    }

    fn geometric_dimension(&self) -> usize {
        self.geometric_dimension
    }

    fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn facet_count(&self) -> usize {
        self.facets.len()
    }

    fn boundary_elements(&self, cell: CellId) -> &[FacetId] {
        self.cell_facets_slice(cell)
    }

    fn coboundary_elements(&self, facet: FacetId) -> &[CellId] {
        self.facet_cells_slice(facet)
    }

    fn cell_centroid(&self, cell: CellId) -> [f64; 3] {
        self.cell_centroids
            .get(cell.idx())
            .copied()
            .unwrap_or([0.0; 3])
    }

    fn facet_centroid(&self, facet: FacetId) -> [f64; 3] {
        self.facet_centroids
            .get(facet.idx())
            .copied()
            .unwrap_or([0.0; 3])
    }

    fn facet_vertices(&self, facet: FacetId) -> &[VertexId] {
        self.facets
            .get(facet.idx())
            .map_or(&[], |f| f.vertices.as_slice())
    }

    fn vertex_position(&self, vertex: VertexId) -> [f64; 3] {
        self.vertices
            .get(vertex.idx())
            .map_or([0.0; 3], |v| v.position)
    }
}
