//! Mesh validation logic.

use std::collections::HashSet;
use sf_core::{CellId, FacetId, VertexId};

use crate::error::{MeshError, MeshResult};
use crate::mesh::{Cell, Vertex};

/// Validate the raw builder input and return the common cell dimension.
pub(crate) fn validate_input(
    geometric_dimension: usize,
    vertices: &[Vertex],
    coordinate_counts: &[usize],
    cells: &[Cell],
) -> MeshResult<usize> {
    if !(1..=3).contains(&geometric_dimension) {
        return Err(MeshError::UnsupportedGeometricDimension {
            dim: geometric_dimension,
        });
    }

    for (vertex, &count) in vertices.iter().zip(coordinate_counts) {
        if count != geometric_dimension {
            return Err(MeshError::VertexDimensionMismatch {
                vertex: vertex.id,
                expected: geometric_dimension,
                actual: count,
            });
        }
    }

    let first = cells.first().ok_or(MeshError::Empty)?;
    let cell_dimension = first.shape.dimension();
    if cell_dimension > geometric_dimension {
        return Err(MeshError::CellExceedsGeometry {
            cell_dim: cell_dimension,
            geo_dim: geometric_dimension,
        });
    }

    for cell in cells {
        if cell.shape.dimension() != cell_dimension {
            return Err(MeshError::MixedCellDimension {
                cell: cell.id,
                expected: cell_dimension,
                actual: cell.shape.dimension(),
            });
        }

        if cell.vertices.len() != cell.shape.vertex_count() {
            return Err(MeshError::WrongVertexCount {
                cell: cell.id,
                shape: cell.shape,
                count: cell.vertices.len(),
            });
        }

        // Every vertex must exist
        for &v in &cell.vertices {
            if v.idx() >= vertices.len() {
                return Err(MeshError::InvalidVertexRef {
                    cell: cell.id,
                    vertex: v,
                });
            }
        }

        // Vertices must be distinct
        let unique: HashSet<VertexId> = cell.vertices.iter().copied().collect();
        if unique.len() != cell.vertices.len() {
            return Err(MeshError::DuplicateVertex { cell: cell.id });
        }
    }

    Ok(cell_dimension)
}

/// Validate that the two adjacency directions agree.
pub(crate) fn validate_adjacency(
    cell_count: usize,
    cell_facet_offsets: &[usize],
    cell_facets: &[FacetId],
    facet_cell_offsets: &[usize],
    facet_cells: &[CellId],
) -> MeshResult<()> {
    let facet_count = facet_cell_offsets.len().saturating_sub(1);

    for c in 0..cell_count {
        let cell = CellId::from_usize(c);
        for &facet in &cell_facets[cell_facet_offsets[c]..cell_facet_offsets[c + 1]] {
            if facet.idx() >= facet_count {
                return Err(MeshError::InconsistentAdjacency { cell, facet });
            }
            let cob = &facet_cells[facet_cell_offsets[facet.idx()]..facet_cell_offsets[facet.idx() + 1]];
            if !cob.contains(&cell) {
                return Err(MeshError::InconsistentAdjacency { cell, facet });
            }
        }
    }

    for f in 0..facet_count {
        let facet = FacetId::from_usize(f);
        for &cell in &facet_cells[facet_cell_offsets[f]..facet_cell_offsets[f + 1]] {
            if cell.idx() >= cell_count {
                return Err(MeshError::InconsistentAdjacency { cell, facet });
            }
            let bnd = &cell_facets[cell_facet_offsets[cell.idx()]..cell_facet_offsets[cell.idx() + 1]];
            if !bnd.contains(&facet) {
                return Err(MeshError::InconsistentAdjacency { cell, facet });
            }
        }
    }

    Ok(())
}
