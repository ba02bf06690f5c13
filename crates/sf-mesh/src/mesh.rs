//! Core mesh data structures.

use sf_core::{CellId, FacetId, RegionId, VertexId};

/// Reference shape of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellShape {
    /// 1-D segment.
    Line,
    /// 2-D triangle.
    Triangle,
    /// 2-D quadrilateral, vertices in cyclic order.
    Quadrilateral,
    /// 3-D tetrahedron.
    Tetrahedron,
}

const LINE_FACETS: &[&[usize]] = &[&[0], &[1]];
const TRIANGLE_FACETS: &[&[usize]] = &[&[0, 1], &[1, 2], &[2, 0]];
const QUAD_FACETS: &[&[usize]] = &[&[0, 1], &[1, 2], &[2, 3], &[3, 0]];
const TET_FACETS: &[&[usize]] = &[&[0, 1, 2], &[0, 1, 3], &[0, 2, 3], &[1, 2, 3]];

impl CellShape {
    /// Topological dimension of the shape.
    pub fn dimension(self) -> usize {
        match self {
            CellShape::Line => 1,
            CellShape::Triangle | CellShape::Quadrilateral => 2,
            CellShape::Tetrahedron => 3,
        }
    }

    /// Number of vertices.
    pub fn vertex_count(self) -> usize {
        match self {
            CellShape::Line => 2,
            CellShape::Triangle => 3,
            CellShape::Quadrilateral => 4,
            CellShape::Tetrahedron => 4,
        }
    }

    /// Facets as lists of local vertex indices, in local facet order.
    pub fn local_facets(self) -> &'static [&'static [usize]] {
        match self {
            CellShape::Line => LINE_FACETS,
            CellShape::Triangle => TRIANGLE_FACETS,
            CellShape::Quadrilateral => QUAD_FACETS,
            CellShape::Tetrahedron => TET_FACETS,
        }
    }
}

/// A mesh vertex. Coordinates beyond the geometric dimension are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub id: VertexId,
    pub position: [f64; 3],
}

/// A cell (control volume of the box method).
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub id: CellId,
    pub shape: CellShape,
    pub vertices: Vec<VertexId>,
    pub region: RegionId,
}

/// A facet: codimension-1 boundary element shared by one or two cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Facet {
    pub id: FacetId,
    /// Vertices in the orientation of the first cell that produced the facet.
    pub vertices: Vec<VertexId>,
}

/// The mesh: a validated, immutable collection of vertices, cells and facets.
///
/// The mesh stores:
/// - All entities in vectors (indexed by their IDs).
/// - Compact adjacency in both directions (cell -> facets, facet -> cells).
/// - Cached centroids and measures.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub(crate) geometric_dimension: usize,
    pub(crate) cell_dimension: usize,

    pub(crate) vertices: Vec<Vertex>,
    pub(crate) cells: Vec<Cell>,
    pub(crate) facets: Vec<Facet>,

    /// Cell i's facets are in cell_facets[cell_facet_offsets[i]..cell_facet_offsets[i+1]],
    /// in the local facet order of the cell's shape.
    pub(crate) cell_facet_offsets: Vec<usize>,
    pub(crate) cell_facets: Vec<FacetId>,

    /// Facet j's cells are in facet_cells[facet_cell_offsets[j]..facet_cell_offsets[j+1]],
    /// in cell insertion order (the first one owns the facet orientation).
    pub(crate) facet_cell_offsets: Vec<usize>,
    pub(crate) facet_cells: Vec<CellId>,

    pub(crate) cell_centroids: Vec<[f64; 3]>,
    pub(crate) facet_centroids: Vec<[f64; 3]>,
    pub(crate) cell_measures: Vec<f64>,
    pub(crate) facet_measures: Vec<f64>,
}

impl Mesh {
    /// Return all vertices.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Return all cells.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Return all facets.
    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    /// Get a cell by ID (returns None if ID out of bounds).
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.idx())
    }

    /// Get a facet by ID (returns None if ID out of bounds).
    pub fn facet(&self, id: FacetId) -> Option<&Facet> {
        self.facets.get(id.idx())
    }

    /// Region of a cell.
    pub fn region(&self, cell: CellId) -> Option<RegionId> {
        self.cell(cell).map(|c| c.region)
    }

    /// Volume (length/area) of a cell; 0 for an unknown ID.
    pub fn cell_measure(&self, cell: CellId) -> f64 {
        self.cell_measures.get(cell.idx()).copied().unwrap_or(0.0)
    }

    /// Area (length/1 for points) of a facet; 0 for an unknown ID.
    pub fn facet_measure(&self, facet: FacetId) -> f64 {
        self.facet_measures.get(facet.idx()).copied().unwrap_or(0.0)
    }

    /// Iterate over all cell IDs in index order.
    pub fn cell_ids(&self) -> impl ExactSizeIterator<Item = CellId> + '_ {
        self.cells.iter().map(|c| c.id)
    }

    /// Iterate over all facet IDs in index order.
    pub fn facet_ids(&self) -> impl ExactSizeIterator<Item = FacetId> + '_ {
        self.facets.iter().map(|f| f.id)
    }

    /// Cells of the given region, in index order.
    pub fn cells_in_region(&self, region: RegionId) -> Vec<CellId> {
        self.cells
            .iter()
            .filter(|c| c.region == region)
            .map(|c| c.id)
            .collect()
    }

    /// The neighbour across `facet` as seen from `cell` (None on the boundary).
    pub fn neighbor(&self, cell: CellId, facet: FacetId) -> Option<CellId> {
        let cells = self.facet_cells_slice(facet);
        match cells {
            [a, b] if *a == cell => Some(*b),
            [a, b] if *b == cell => Some(*a),
            _ => None,
        }
    }

    /// Whether the facet lies on the mesh boundary.
    pub fn is_boundary_facet(&self, facet: FacetId) -> bool {
        self.facet_cells_slice(facet).len() == 1
    }

    pub(crate) fn cell_facets_slice(&self, cell: CellId) -> &[FacetId] {
        let idx = cell.idx();
        if idx >= self.cells.len() {
            return &[];
        }
        let start = self.cell_facet_offsets[idx];
        let end = self.cell_facet_offsets[idx + 1];
        &self.cell_facets[start..end]
    }

    pub(crate) fn facet_cells_slice(&self, facet: FacetId) -> &[CellId] {
        let idx = facet.idx();
        if idx >= self.facets.len() {
            return &[];
        }
        let start = self.facet_cell_offsets[idx];
        let end = self.facet_cell_offsets[idx + 1];
        &self.facet_cells[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_tables_are_consistent() {
        for shape in [
            CellShape::Line,
            CellShape::Triangle,
            CellShape::Quadrilateral,
            CellShape::Tetrahedron,
        ] {
            for facet in shape.local_facets() {
                assert_eq!(facet.len(), shape.dimension());
                assert!(facet.iter().all(|&i| i < shape.vertex_count()));
            }
        }
    }

    #[test]
    fn shape_dimensions() {
        assert_eq!(CellShape::Line.dimension(), 1);
        assert_eq!(CellShape::Quadrilateral.dimension(), 2);
        assert_eq!(CellShape::Tetrahedron.local_facets().len(), 4);
    }
}
