//! Two-point facet coupling of the box method.
//!
//! Each interior facet couples its two cells with `κ = |f| / |c_a - c_b|`.
//! Boundary facets carry no coupling (zero normal flux).

use sf_core::{CellId, FacetId};
use sf_mesh::geometry;
use sf_mesh::{Mesh, Topology};

use crate::error::{DeviceError, DeviceResult};

/// A facet between two cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FacetLink {
    pub owner: usize,
    pub neighbor: Option<usize>,
    pub area: f64,
    pub distance: f64,
}

impl FacetLink {
    pub fn kappa(&self) -> f64 {
        self.area / self.distance
    }
}

/// A facet as seen from one of its cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Neighbor {
    pub cell: usize,
    pub kappa: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct Coupling {
    pub volumes: Vec<f64>,
    pub facets: Vec<FacetLink>,
    pub neighbors: Vec<Vec<Neighbor>>,
}

impl Coupling {
    pub fn build(mesh: &Mesh) -> DeviceResult<Self> {
        let volumes: Vec<f64> = mesh.cell_ids().map(|c| mesh.cell_measure(c)).collect();

        let mut facets = Vec::with_capacity(mesh.facet_count());
        for facet in mesh.facet_ids() {
            facets.push(facet_link(mesh, facet)?);
        }

        let mut neighbors = Vec::with_capacity(volumes.len());
        for cell in mesh.cell_ids() {
            let mut list = Vec::new();
            for &facet in mesh.boundary_elements(cell) {
                let link = &facets[facet.idx()];
                let other = match (link.owner == cell.idx(), link.neighbor) {
                    (true, other) => other,
                    (false, Some(n)) if n == cell.idx() => Some(link.owner),
                    (false, _) => {
                        return Err(DeviceError::MalformedMesh {
                            facet,
                            what: format!("cell {cell} is not on the facet's coboundary"),
                        });
                    }
                };
                if let Some(other) = other {
                    list.push(Neighbor {
                        cell: other,
                        kappa: link.kappa(),
                    });
                }
            }
            neighbors.push(list);
        }

        Ok(Self {
            volumes,
            facets,
            neighbors,
        })
    }

    pub fn cell_count(&self) -> usize {
        self.volumes.len()
    }
}

fn facet_link(mesh: &Mesh, facet: FacetId) -> DeviceResult<FacetLink> {
    let area = mesh.facet_measure(facet);
    if !(area.is_finite() && area > 0.0) {
        return Err(DeviceError::MalformedMesh {
            facet,
            what: format!("facet measure {area}"),
        });
    }
    match mesh.coboundary_elements(facet) {
        [owner] => Ok(FacetLink {
            owner: owner.idx(),
            neighbor: None,
            area,
            distance: geometry::distance(mesh.cell_centroid(*owner), mesh.facet_centroid(facet)),
        }),
        [a, b] => {
            let distance = centroid_distance(mesh, *a, *b);
            if !(distance.is_finite() && distance > 0.0) {
                return Err(DeviceError::MalformedMesh {
                    facet,
                    what: format!("coincident centroids of cells {a} and {b}"),
                });
            }
            Ok(FacetLink {
                owner: a.idx(),
                neighbor: Some(b.idx()),
                area,
                distance,
            })
        }
        cells => Err(DeviceError::MalformedMesh {
            facet,
            what: format!("{} cells on coboundary", cells.len()),
        }),
    }
}

fn centroid_distance(mesh: &Mesh, a: CellId, b: CellId) -> f64 {
    geometry::distance(mesh.cell_centroid(a), mesh.cell_centroid(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::RegionId;
    use sf_mesh::structured::{RectElements, line_mesh, rect_mesh};

    #[test]
    fn line_coupling() {
        let mesh = line_mesh(0.0, 1.0, 4, |_| RegionId(0)).unwrap();
        let c = Coupling::build(&mesh).unwrap();
        assert_eq!(c.cell_count(), 4);
        assert_eq!(c.neighbors[0].len(), 1);
        assert_eq!(c.neighbors[1].len(), 2);
        for n in &c.neighbors[1] {
            assert!((n.kappa - 4.0).abs() < 1e-12);
        }
        assert!(c.facets.iter().all(|f| f.neighbor.is_none() || (f.distance - 0.25).abs() < 1e-12));
        let boundary = c.facets.iter().filter(|f| f.neighbor.is_none()).count();
        assert_eq!(boundary, 2);
    }

    #[test]
    fn neighbours_are_symmetric() {
        let mesh = rect_mesh(1.0, 1.0, 3, 2, RectElements::Triangles, |_| RegionId(0)).unwrap();
        let c = Coupling::build(&mesh).unwrap();
        for (i, list) in c.neighbors.iter().enumerate() {
            for n in list {
                let back = c.neighbors[n.cell].iter().find(|m| m.cell == i).unwrap();
                assert_eq!(back.kappa, n.kappa);
            }
        }
    }
}
