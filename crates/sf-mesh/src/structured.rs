//! Structured grid helpers.
//!
//! These build small tensor-product meshes for device tests and demos. The
//! region of each cell is chosen by a callback on the cell's centroid.

use sf_core::{RegionId, VertexId};

use crate::builder::MeshBuilder;
use crate::error::MeshResult;
use crate::geometry::{self, Point};
use crate::mesh::{CellShape, Mesh};

/// Element type used when subdividing a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RectElements {
    Quadrilaterals,
    /// Each rectangle split along its lower-left to upper-right diagonal.
    Triangles,
}

/// Uniform 1-D mesh of `cells` segments over `[x0, x1]`.
pub fn line_mesh<F>(x0: f64, x1: f64, cells: usize, region: F) -> MeshResult<Mesh>
where
    F: Fn(Point) -> RegionId,
{
    let mut b = MeshBuilder::new(1);
    let h = (x1 - x0) / cells as f64;
    let vertices: Vec<VertexId> = (0..=cells)
        .map(|i| b.add_vertex(&[x0 + h * i as f64]))
        .collect();

    for (i, w) in vertices.windows(2).enumerate() {
        let mid = [x0 + h * (i as f64 + 0.5), 0.0, 0.0];
        b.add_cell(CellShape::Line, &[w[0], w[1]], region(mid));
    }
    b.build()
}

/// Uniform 2-D mesh of `nx * ny` rectangles over `[0, lx] x [0, ly]`.
pub fn rect_mesh<F>(
    lx: f64,
    ly: f64,
    nx: usize,
    ny: usize,
    elements: RectElements,
    region: F,
) -> MeshResult<Mesh>
where
    F: Fn(Point) -> RegionId,
{
    let mut b = MeshBuilder::new(2);
    let hx = lx / nx as f64;
    let hy = ly / ny as f64;

    let mut ids = Vec::with_capacity((nx + 1) * (ny + 1));
    let mut points = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            let p = [hx * i as f64, hy * j as f64];
            ids.push(b.add_vertex(&p));
            points.push([p[0], p[1], 0.0]);
        }
    }
    let at = |i: usize, j: usize| j * (nx + 1) + i;

    for j in 0..ny {
        for i in 0..nx {
            let (a, bb, c, d) = (at(i, j), at(i + 1, j), at(i + 1, j + 1), at(i, j + 1));
            match elements {
                RectElements::Quadrilaterals => {
                    let centre = geometry::centroid(&[points[a], points[bb], points[c], points[d]]);
                    b.add_cell(
                        CellShape::Quadrilateral,
                        &[ids[a], ids[bb], ids[c], ids[d]],
                        region(centre),
                    );
                }
                RectElements::Triangles => {
                    let lower = geometry::centroid(&[points[a], points[bb], points[c]]);
                    b.add_cell(CellShape::Triangle, &[ids[a], ids[bb], ids[c]], region(lower));
                    let upper = geometry::centroid(&[points[a], points[c], points[d]]);
                    b.add_cell(CellShape::Triangle, &[ids[a], ids[c], ids[d]], region(upper));
                }
            }
        }
    }
    b.build()
}
