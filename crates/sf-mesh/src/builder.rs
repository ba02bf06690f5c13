//! Incremental mesh builder.

use std::collections::HashMap;
use sf_core::{CellId, FacetId, Id, RegionId, VertexId};

use crate::error::{MeshError, MeshResult};
use crate::geometry::{self, Point};
use crate::mesh::{Cell, CellShape, Facet, Mesh, Vertex};
use crate::validate;

/// Builder for constructing a mesh incrementally.
///
/// Use `add_vertex` and `add_cell` to describe the cells, then call `build()`
/// to derive facets, validate the topology and freeze it into an immutable
/// `Mesh`. Facets are numbered in the order they are first encountered and
/// the first cell that touches a facet becomes its owner (first coboundary
/// entry).
#[derive(Debug)]
pub struct MeshBuilder {
    geometric_dimension: usize,
    vertices: Vec<Vertex>,
    coordinate_counts: Vec<usize>,
    cells: Vec<Cell>,
}

impl MeshBuilder {
    /// Create a new empty builder for the given embedding dimension.
    pub fn new(geometric_dimension: usize) -> Self {
        Self {
            geometric_dimension,
            vertices: Vec::new(),
            coordinate_counts: Vec::new(),
            cells: Vec::new(),
        }
    }

    /// Add a vertex and return its ID.
    ///
    /// The coordinate count is checked against the geometric dimension in
    /// `build()`.
    pub fn add_vertex(&mut self, coords: &[f64]) -> VertexId {
        let id = VertexId::from_usize(self.vertices.len());
        let mut position = [0.0; 3];
        for (dst, src) in position.iter_mut().zip(coords) {
            *dst = *src;
        }
        self.vertices.push(Vertex { id, position });
        self.coordinate_counts.push(coords.len());
        id
    }

    /// Add a cell over existing vertices and return its ID.
    pub fn add_cell(&mut self, shape: CellShape, vertices: &[VertexId], region: RegionId) -> CellId {
        let id = CellId::from_usize(self.cells.len());
        self.cells.push(Cell {
            id,
            shape,
            vertices: vertices.to_vec(),
            region,
        });
        id
    }

    /// Reassign the region of a cell (useful for post-construction tagging).
    pub fn set_region(&mut self, cell: CellId, region: RegionId) {
        if let Some(c) = self.cells.get_mut(cell.idx()) {
            c.region = region;
        }
    }

    /// Number of cells added so far.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Build and validate the mesh.
    pub fn build(self) -> MeshResult<Mesh> {
        check_id_range("vertices", self.vertices.len())?;
        check_id_range("cells", self.cells.len())?;
        let cell_dimension = validate::validate_input(
            self.geometric_dimension,
            &self.vertices,
            &self.coordinate_counts,
            &self.cells,
        )?;

        let (facets, cell_facet_offsets, cell_facets, facet_cell_lists) =
            Self::derive_facets(&self.cells)?;

        // Flatten facet -> cells
        let mut facet_cell_offsets = Vec::with_capacity(facets.len() + 1);
        let mut facet_cells = Vec::new();
        facet_cell_offsets.push(0);
        for (i, list) in facet_cell_lists.iter().enumerate() {
            if list.len() > 2 {
                return Err(MeshError::NonManifoldFacet {
                    facet: FacetId::from_usize(i),
                    cells: list.len(),
                });
            }
            facet_cells.extend_from_slice(list);
            facet_cell_offsets.push(facet_cells.len());
        }

        validate::validate_adjacency(
            self.cells.len(),
            &cell_facet_offsets,
            &cell_facets,
            &facet_cell_offsets,
            &facet_cells,
        )?;

        let position = |v: &VertexId| self.vertices[v.idx()].position;

        let mut cell_centroids = Vec::with_capacity(self.cells.len());
        let mut cell_measures = Vec::with_capacity(self.cells.len());
        for cell in &self.cells {
            let points: Vec<Point> = cell.vertices.iter().map(position).collect();
            let measure = geometry::measure(&points, cell.shape == CellShape::Tetrahedron);
            if !(measure.is_finite() && measure > 0.0) {
                return Err(MeshError::DegenerateCell { cell: cell.id });
            }
            cell_centroids.push(geometry::centroid(&points));
            cell_measures.push(measure);
        }

        let mut facet_centroids = Vec::with_capacity(facets.len());
        let mut facet_measures = Vec::with_capacity(facets.len());
        for facet in &facets {
            let points: Vec<Point> = facet.vertices.iter().map(position).collect();
            facet_centroids.push(geometry::centroid(&points));
            facet_measures.push(geometry::measure(&points, false));
        }

        Ok(Mesh {
            geometric_dimension: self.geometric_dimension,
            cell_dimension,
            vertices: self.vertices,
            cells: self.cells,
            facets,
            cell_facet_offsets,
            cell_facets,
            facet_cell_offsets,
            facet_cells,
            cell_centroids,
            facet_centroids,
            cell_measures,
            facet_measures,
        })
    }

    /// Derive unique facets from the cells' local facet tables.
    ///
    /// Facets are identified by their sorted vertex set.
    #[allow(clippy::type_complexity)]
    fn derive_facets(
        cells: &[Cell],
    ) -> MeshResult<(Vec<Facet>, Vec<usize>, Vec<FacetId>, Vec<Vec<CellId>>)> {
        let mut lookup: HashMap<Vec<VertexId>, FacetId> = HashMap::new();
        let mut facets: Vec<Facet> = Vec::new();
        let mut facet_cells: Vec<Vec<CellId>> = Vec::new();

        let mut offsets = Vec::with_capacity(cells.len() + 1);
        let mut flat = Vec::new();
        offsets.push(0);

        for cell in cells {
            for local in cell.shape.local_facets() {
                let vertices: Vec<VertexId> = local.iter().map(|&i| cell.vertices[i]).collect();
                let mut key = vertices.clone();
                key.sort();

                let facet_id = match lookup.get(&key) {
                    Some(&id) => id,
                    None => {
                        let id = FacetId::try_from_usize(facets.len()).ok_or(
                            MeshError::TooManyEntities {
                                what: "facets",
                                count: facets.len() + 1,
                            },
                        )?;
                        lookup.insert(key, id);
                        facets.push(Facet { id, vertices });
                        facet_cells.push(Vec::new());
                        id
                    }
                };
                facet_cells[facet_id.idx()].push(cell.id);
                flat.push(facet_id);
            }
            offsets.push(flat.len());
        }

        Ok((facets, offsets, flat, facet_cells))
    }
}

/// Entity counts must fit the `u32` id space.
fn check_id_range(what: &'static str, count: usize) -> MeshResult<()> {
    if count > Id::MAX_INDEX + 1 {
        return Err(MeshError::TooManyEntities { what, count });
    }
    Ok(())
}
