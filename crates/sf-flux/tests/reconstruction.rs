//! Reconstruction against hand-built patches and structured meshes.

use nalgebra::DVector;
use proptest::prelude::*;
use sf_core::{CellId, FacetId, RegionId, VertexId};
use sf_flux::{FluxError, outer_normal, reconstruct_all_to_vec, reconstruct_cell_flux};
use sf_mesh::structured::{RectElements, line_mesh, rect_mesh};
use sf_mesh::{Mesh, Topology};

/// A single 2-D cell with an arbitrary set of edge facets.
struct Patch {
    positions: Vec<[f64; 3]>,
    facets: Vec<Vec<VertexId>>,
    cell_facets: Vec<FacetId>,
    owners: Vec<Vec<CellId>>,
    centroid: [f64; 3],
}

impl Patch {
    fn new(centroid: [f64; 2], edges: &[([f64; 2], [f64; 2])]) -> Self {
        let mut positions = Vec::new();
        let mut facets = Vec::new();
        for (a, b) in edges {
            let va = VertexId::from_usize(positions.len());
            positions.push([a[0], a[1], 0.0]);
            let vb = VertexId::from_usize(positions.len());
            positions.push([b[0], b[1], 0.0]);
            facets.push(vec![va, vb]);
        }
        let n = edges.len();
        Self {
            positions,
            facets,
            cell_facets: (0..n).map(FacetId::from_usize).collect(),
            owners: vec![vec![CellId::from_index(0)]; n],
            centroid: [centroid[0], centroid[1], 0.0],
        }
    }
}

impl Topology for Patch {
    fn cell_dimension(&self) -> usize {
        2
    }
    fn geometric_dimension(&self) -> usize {
        2
    }
    fn cell_count(&self) -> usize {
        1
    }
    fn facet_count(&self) -> usize {
        self.facets.len()
    }
    fn boundary_elements(&self, cell: CellId) -> &[FacetId] {
        if cell.idx() == 0 { self.cell_facets.as_slice() } else { &[] }
    }
    fn coboundary_elements(&self, facet: FacetId) -> &[CellId] {
        self.owners.get(facet.idx()).map(Vec::as_slice).unwrap_or(&[])
    }
    fn cell_centroid(&self, _cell: CellId) -> [f64; 3] {
        self.centroid
    }
    fn facet_centroid(&self, facet: FacetId) -> [f64; 3] {
        let vs = &self.facets[facet.idx()];
        let a = self.positions[vs[0].idx()];
        let b = self.positions[vs[1].idx()];
        [0.5 * (a[0] + b[0]), 0.5 * (a[1] + b[1]), 0.0]
    }
    fn facet_vertices(&self, facet: FacetId) -> &[VertexId] {
        &self.facets[facet.idx()]
    }
    fn vertex_position(&self, vertex: VertexId) -> [f64; 3] {
        self.positions[vertex.idx()]
    }
}

/// A mesh view whose coboundary lists are reversed.
struct Reversed<'a> {
    inner: &'a Mesh,
    coboundary: Vec<Vec<CellId>>,
}

impl<'a> Reversed<'a> {
    fn new(inner: &'a Mesh) -> Self {
        let coboundary = inner
            .facet_ids()
            .map(|f| inner.coboundary_elements(f).iter().rev().copied().collect())
            .collect();
        Self { inner, coboundary }
    }
}

impl Topology for Reversed<'_> {
    fn cell_dimension(&self) -> usize {
        self.inner.cell_dimension()
    }
    fn geometric_dimension(&self) -> usize {
        self.inner.geometric_dimension()
    }
    fn cell_count(&self) -> usize {
        self.inner.cell_count()
    }
    fn facet_count(&self) -> usize {
        self.inner.facet_count()
    }
    fn boundary_elements(&self, cell: CellId) -> &[FacetId] {
        self.inner.boundary_elements(cell)
    }
    fn coboundary_elements(&self, facet: FacetId) -> &[CellId] {
        &self.coboundary[facet.idx()]
    }
    fn cell_centroid(&self, cell: CellId) -> [f64; 3] {
        self.inner.cell_centroid(cell)
    }
    fn facet_centroid(&self, facet: FacetId) -> [f64; 3] {
        self.inner.facet_centroid(facet)
    }
    fn facet_vertices(&self, facet: FacetId) -> &[VertexId] {
        self.inner.facet_vertices(facet)
    }
    fn vertex_position(&self, vertex: VertexId) -> [f64; 3] {
        self.inner.vertex_position(vertex)
    }
}

#[test]
fn two_orthogonal_facets_reconstruct_exactly() {
    let patch = Patch::new(
        [0.0, 0.0],
        &[([1.0, -1.0], [1.0, 1.0]), ([1.0, 1.0], [-1.0, 1.0])],
    );
    let cell = CellId::from_index(0);
    let fluxes = vec![3.0, 4.0];
    let v = reconstruct_cell_flux(&patch, cell, &fluxes).unwrap();

    for (i, expected) in [3.0, 4.0].into_iter().enumerate() {
        let n = outer_normal(&patch, cell, FacetId::from_usize(i)).unwrap();
        assert!((n.dot(&v) - expected).abs() < 1e-14);
    }
    assert_eq!(v.as_slice(), &[3.0, 4.0]);
}

#[test]
fn parallel_normals_are_singular() {
    let patch = Patch::new(
        [0.0, 0.0],
        &[([1.0, -1.0], [1.0, 1.0]), ([-1.0, 1.0], [-1.0, -1.0])],
    );
    let cell = CellId::from_index(0);
    let fluxes = vec![1.0, -1.0];
    assert_eq!(
        reconstruct_cell_flux(&patch, cell, &fluxes),
        Err(FluxError::SingularSystem { cell: Some(cell) })
    );
}

#[test]
fn swapping_coboundary_order_flips_sign() {
    let mesh = line_mesh(0.0, 2.0, 2, |_| RegionId(0)).unwrap();
    let fluxes = vec![0.0, 2.0, 0.0];
    let c0 = CellId::from_index(0);

    let straight = reconstruct_cell_flux(&mesh, c0, &fluxes).unwrap();
    assert_eq!(straight.as_slice(), &[1.0]);

    // facet 0 is a boundary facet, so only the shared one changes owner
    let reversed = Reversed::new(&mesh);
    let flipped = reconstruct_cell_flux(&reversed, c0, &fluxes).unwrap();
    assert_eq!(flipped.as_slice(), &[-1.0]);
}

#[test]
fn unsupported_dimension_propagates() {
    let mut b = sf_mesh::MeshBuilder::new(2);
    let v0 = b.add_vertex(&[0.0, 0.0]);
    let v1 = b.add_vertex(&[1.0, 1.0]);
    b.add_cell(sf_mesh::CellShape::Line, &[v0, v1], RegionId(0));
    let mesh = b.build().unwrap();
    let fluxes = vec![0.0, 0.0];
    assert!(matches!(
        reconstruct_all_to_vec(&mesh, &fluxes),
        Err(FluxError::UnsupportedDimension { cell_dim: 1, geo_dim: 2 })
    ));
}

/// Facet fluxes of a constant vector field, oriented from each facet's owner.
fn owner_fluxes(mesh: &Mesh, field: &DVector<f64>) -> Vec<f64> {
    mesh.facet_ids()
        .map(|f| {
            let owner = mesh.coboundary_elements(f)[0];
            outer_normal(mesh, owner, f).unwrap().dot(field)
        })
        .collect()
}

proptest! {
    #[test]
    fn constant_field_is_reproduced_on_triangles(
        fx in -10.0..10.0_f64,
        fy in -10.0..10.0_f64,
        nx in 1usize..5,
        ny in 1usize..5,
    ) {
        let mesh = rect_mesh(1.5, 0.7, nx, ny, RectElements::Triangles, |_| RegionId(0)).unwrap();
        let field = DVector::from_vec(vec![fx, fy]);
        let fluxes = owner_fluxes(&mesh, &field);
        for v in reconstruct_all_to_vec(&mesh, &fluxes).unwrap() {
            prop_assert!((v - &field).amax() < 1e-10);
        }
    }

    #[test]
    fn constant_field_is_reproduced_on_quads(
        fx in -10.0..10.0_f64,
        fy in -10.0..10.0_f64,
    ) {
        let mesh = rect_mesh(2.0, 1.0, 3, 2, RectElements::Quadrilaterals, |_| RegionId(0)).unwrap();
        let field = DVector::from_vec(vec![fx, fy]);
        let fluxes = owner_fluxes(&mesh, &field);
        for v in reconstruct_all_to_vec(&mesh, &fluxes).unwrap() {
            prop_assert!((v - &field).amax() < 1e-10);
        }
    }
}
