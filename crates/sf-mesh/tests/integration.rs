//! Integration tests for the mesh crate.

use sf_core::{CellId, RegionId};
use sf_mesh::geometry;
use sf_mesh::structured::{RectElements, line_mesh, rect_mesh};
use sf_mesh::{CellShape, MeshBuilder, Topology};

#[test]
fn every_facet_has_one_or_two_cells() {
    let mesh = rect_mesh(1.0, 2.0, 3, 4, RectElements::Triangles, |_| RegionId(0)).unwrap();
    for f in mesh.facet_ids() {
        let n = mesh.coboundary_elements(f).len();
        assert!(n == 1 || n == 2, "facet {f} has {n} cells");
        for &c in mesh.coboundary_elements(f) {
            assert!(mesh.boundary_elements(c).contains(&f));
        }
    }
}

#[test]
fn boundary_elements_follow_local_facet_order() {
    let mut b = MeshBuilder::new(2);
    let v0 = b.add_vertex(&[0.0, 0.0]);
    let v1 = b.add_vertex(&[1.0, 0.0]);
    let v2 = b.add_vertex(&[0.0, 1.0]);
    let c = b.add_cell(CellShape::Triangle, &[v0, v1, v2], RegionId(3));
    let mesh = b.build().unwrap();

    let facets = mesh.boundary_elements(c);
    assert_eq!(facets.len(), 3);
    assert_eq!(mesh.facet_vertices(facets[0]), &[v0, v1]);
    assert_eq!(mesh.facet_vertices(facets[1]), &[v1, v2]);
    assert_eq!(mesh.facet_vertices(facets[2]), &[v2, v0]);

    let mid = mesh.facet_centroid(facets[1]);
    assert!((mid[0] - 0.5).abs() < 1e-15 && (mid[1] - 0.5).abs() < 1e-15);
}

#[test]
fn one_dimensional_facets_are_points() {
    let mesh = line_mesh(0.0, 3.0, 3, |_| RegionId(1)).unwrap();
    let c1 = CellId::from_index(1);
    let facets = mesh.boundary_elements(c1);
    assert_eq!(facets.len(), 2);
    for &f in facets {
        assert_eq!(mesh.facet_measure(f), 1.0);
        assert_eq!(mesh.facet_vertices(f).len(), 1);
    }
    let xs: Vec<f64> = facets.iter().map(|&f| mesh.facet_centroid(f)[0]).collect();
    assert_eq!(xs, vec![1.0, 2.0]);
}

#[test]
fn tetrahedral_mesh_volumes() {
    let mut b = MeshBuilder::new(3);
    let v0 = b.add_vertex(&[0.0, 0.0, 0.0]);
    let v1 = b.add_vertex(&[1.0, 0.0, 0.0]);
    let v2 = b.add_vertex(&[0.0, 1.0, 0.0]);
    let v3 = b.add_vertex(&[0.0, 0.0, 1.0]);
    let v4 = b.add_vertex(&[1.0, 1.0, 1.0]);
    b.add_cell(CellShape::Tetrahedron, &[v0, v1, v2, v3], RegionId(0));
    b.add_cell(CellShape::Tetrahedron, &[v1, v2, v3, v4], RegionId(0));
    let mesh = b.build().unwrap();

    assert_eq!(mesh.cell_dimension(), 3);
    assert_eq!(mesh.facet_count(), 7);
    assert!((mesh.cell_measure(CellId::from_index(0)) - 1.0 / 6.0).abs() < 1e-15);
    assert!((mesh.cell_measure(CellId::from_index(1)) - 1.0 / 3.0).abs() < 1e-15);

    let p = mesh.cell_centroid(CellId::from_index(0));
    assert!((geometry::norm([p[0] - 0.25, p[1] - 0.25, p[2] - 0.25])).abs() < 1e-15);
}
