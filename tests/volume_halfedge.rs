use mesh_kernel::prelude::*;

fn reference_cell(cell_type: CellType) -> Volume {
    let coords: Vec<Vec3> = match cell_type {
        CellType::Tetrahedron => vec![Vec3::zeros(), Vec3::x(), Vec3::y(), Vec3::z()],
        CellType::Hexahedron => (0..8)
            .map(|i| Vec3::new((i & 1) as f64, ((i >> 1) & 1) as f64, ((i >> 2) & 1) as f64))
            .collect(),
        CellType::Wedge => {
            let bottom = [Vec3::zeros(), Vec3::x(), Vec3::y()];
            bottom
                .iter()
                .copied()
                .chain(bottom.iter().map(|p| p + Vec3::z()))
                .collect()
        }
        CellType::Pyramid => vec![
            Vec3::zeros(),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.5, 0.5, 1.0),
        ],
    };
    let n = coords.len();
    let mut m = Volume::new(cell_type);
    for p in coords {
        m.push_point(p);
    }
    m.add_cell(&(0..n).collect::<Vec<_>>());
    m
}

/// Tets `[0, 1, 2, 3]` and `[1, 2, 3, 4]` glued along the face 1-2-3.
fn two_tets() -> Volume {
    let mut m = Volume::tetrahedra();
    for p in [
        Vec3::zeros(),
        Vec3::x(),
        Vec3::y(),
        Vec3::z(),
        Vec3::new(1.0, 1.0, 1.0),
    ] {
        m.push_point(p);
    }
    m.add_cell(&[0, 1, 2, 3]);
    m.add_cell(&[1, 2, 3, 4]);
    m
}

/// Two unit hexes side by side along x; point `(i, j, k)` is `i + 3j + 6k`.
fn hex_pair() -> Volume {
    let mut m = Volume::hexahedra();
    for k in 0..2 {
        for j in 0..2 {
            for i in 0..3 {
                m.push_point(Vec3::new(i as f64, j as f64, k as f64));
            }
        }
    }
    for i0 in 0..2 {
        let verts: Vec<usize> = (0..8)
            .map(|l| (i0 + (l & 1)) + 3 * ((l >> 1) & 1) + 6 * ((l >> 2) & 1))
            .collect();
        m.add_cell(&verts);
    }
    m
}

/// Two unit wedges stacked along z; point `i` of layer `k` is `i + 3k`.
fn wedge_stack() -> Volume {
    let mut m = Volume::wedges();
    for k in 0..3 {
        for p in [Vec3::zeros(), Vec3::x(), Vec3::y()] {
            m.push_point(p + Vec3::new(0.0, 0.0, k as f64));
        }
    }
    m.add_cell(&[0, 1, 2, 3, 4, 5]);
    m.add_cell(&[3, 4, 5, 6, 7, 8]);
    m
}

/// Two pyramids on the unit square 0-1-2-3, apex 4 above and apex 5 below.
fn pyramid_pair() -> Volume {
    let mut m = Volume::pyramids();
    for p in [
        Vec3::zeros(),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.5, 0.5, 1.0),
        Vec3::new(0.5, 0.5, -1.0),
    ] {
        m.push_point(p);
    }
    m.add_cell(&[0, 1, 2, 3, 4]);
    m.add_cell(&[0, 3, 2, 1, 5]);
    m
}

/// Every half-edge of facet `lf` of cell 0 crosses into cell 1 through
/// facet `lf2` and comes back.
fn assert_shared_facet_halfedges(m: &Volume, adj: &CellsAdjacency, lf: usize, lf2: usize) {
    let he = HalfEdgeHelper::new(m);
    let ct = m.cell_type();
    for lh in 0..m.facet_size(lf) {
        let h = he.halfedge(0, lf, lh);
        let o = he.opposite_c(adj, h).unwrap();
        assert_eq!((he.cell(o), he.cell_facet(o)), (1, lf2), "{ct}: half-edge {lh}");
        assert_eq!((he.from(o), he.to(o)), (he.to(h), he.from(h)));
        assert_eq!(he.opposite_c(adj, o), Some(h));
    }
    for h in 0..he.nhalfedges() {
        if let Some(o) = he.opposite_c(adj, h) {
            assert_ne!(he.cell(o), he.cell(h));
            assert_eq!(he.opposite_c(adj, o), Some(h), "{ct}: half-edge {h}");
        }
    }
}

fn assert_outward(m: &Volume) {
    for c in 0..m.ncells() {
        let center = m.cell_bary(c);
        for lf in 0..m.nfacets_per_cell() {
            let out = m.facet_bary(c, lf) - center;
            assert!(m.facet_normal(c, lf).dot(&out) > 0.0, "cell {c} facet {lf}");
        }
    }
}

#[test]
fn reference_facets_point_outward() {
    for ct in CellType::ALL {
        let m = reference_cell(ct);
        let center = m.cell_bary(0);
        for lf in 0..m.nfacets_per_cell() {
            let n = m.facet_normal(0, lf);
            let out = m.facet_bary(0, lf) - center;
            assert!(n.dot(&out) > 0.0, "{ct}: facet {lf} points inward");
            assert!((n.norm() - 1.0).abs() < 1e-12);
        }
    }
}

#[test]
fn reference_cells_are_closed() {
    for ct in CellType::ALL {
        let m = reference_cell(ct);
        let adj = CellsAdjacency::new(&m);
        assert_eq!(adj.nboundary(), ct.nfacets());
        let he = HalfEdgeHelper::new(&m);
        for h in 0..he.nhalfedges() {
            let o = he.opposite_f(h);
            assert_ne!(he.cell_facet(o), he.cell_facet(h));
            assert_eq!(he.opposite_f(o), h, "{ct}: half-edge {h}");
            assert_eq!((he.from(o), he.to(o)), (he.to(h), he.from(h)));
            assert_eq!(he.opposite_c(&adj, h), None);
        }
    }
}

#[test]
fn halfedges_cycle_around_their_facet() {
    let m = reference_cell(CellType::Pyramid);
    let he = HalfEdgeHelper::new(&m);
    assert_eq!(he.nhalfedges(), 16);
    for h in 0..he.nhalfedges() {
        let size = m.facet_size(he.cell_facet(h));
        let mut cur = h;
        for _ in 0..size {
            assert_eq!(he.prev(he.next(cur)), cur);
            assert_eq!(he.to(cur), he.from(he.next(cur)));
            cur = he.next(cur);
        }
        assert_eq!(cur, h);
    }
    let h = he.halfedge(0, 2, 1);
    assert_eq!((he.cell_facet(h), he.facet_halfedge(h)), (2, 1));
    assert_eq!((he.from(h), he.to(h)), (2, 4));
    assert_eq!(he.geom(h), Vec3::new(-0.5, -0.5, 1.0));
}

#[test]
fn tets_share_one_facet() {
    let m = two_tets();
    let adj = CellsAdjacency::new(&m);
    assert_eq!(adj.len(), 8);
    assert_eq!(adj.opposite(0), Some(7));
    assert_eq!(adj.opposite(7), Some(0));
    assert_eq!(adj.opposite_cell(0), Some(1));
    assert_eq!(adj.nboundary(), 6);

    let he = HalfEdgeHelper::new(&m);
    assert_eq!((he.from(0), he.to(0)), (1, 2));
    assert_eq!(he.opposite_c(&adj, 0), Some(23));
    assert_eq!(he.opposite_c(&adj, 23), Some(0));
    assert_eq!(he.opposite_c(&adj, 3), None);
}

#[test]
fn hexes_share_one_facet() {
    let m = hex_pair();
    let adj = CellsAdjacency::new(&m);
    assert_eq!(adj.nboundary(), 10);
    assert_eq!(adj.opposite(1), Some(6));
    assert_eq!(adj.opposite_cell(6), Some(0));

    let he = HalfEdgeHelper::new(&m);
    for lh in 0..4 {
        let h = he.halfedge(0, 1, lh);
        let o = he.opposite_c(&adj, h).unwrap();
        assert_eq!(he.cell(o), 1);
        assert_eq!(he.cell_facet(o), 0);
        assert_eq!(he.opposite_c(&adj, o), Some(h));
    }
}

#[test]
fn wedges_share_one_triangle() {
    let m = wedge_stack();
    assert_outward(&m);
    let adj = CellsAdjacency::new(&m);
    assert_eq!(adj.len(), 10);
    assert_eq!(adj.nboundary(), 8);
    // Top of the lower wedge faces the bottom of the upper one.
    assert_eq!(adj.opposite(1), Some(5));
    assert_eq!(adj.opposite(5), Some(1));
    assert_eq!(adj.opposite_cell(1), Some(1));
    assert!((2..5).all(|lf| adj.is_boundary(lf)));
    assert_shared_facet_halfedges(&m, &adj, 1, 0);
}

#[test]
fn pyramids_share_their_base() {
    let m = pyramid_pair();
    assert_outward(&m);
    let adj = CellsAdjacency::new(&m);
    assert_eq!(adj.nboundary(), 8);
    assert_eq!(adj.opposite(0), Some(5));
    assert_eq!(adj.opposite_cell(5), Some(0));
    assert!((1..5).all(|lf| adj.is_boundary(lf)));
    assert_shared_facet_halfedges(&m, &adj, 0, 0);
}

#[test]
fn deleting_cells_compacts_per_cell_attributes() {
    let mut m = two_tets();
    let cid = CellAttribute::<i32>::new(&m);
    let hf = CellFacetAttribute::<usize>::new(&m);
    let corner = CellCornerAttribute::<usize>::new(&m);
    cid.set(1, 1);
    for i in 0..m.nfacets() {
        hf.set(i, i);
    }
    for i in 0..m.ncorners() {
        corner.set(i, i);
    }

    m.delete_cells(&[true, false]);

    assert_eq!(m.cell_vertices(0), &[1, 2, 3, 4]);
    assert_eq!(cid.to_vec(), vec![1]);
    assert_eq!(hf.to_vec(), vec![4, 5, 6, 7]);
    assert_eq!(corner.to_vec(), vec![4, 5, 6, 7]);

    m.delete_isolated_vertices();
    assert_eq!(m.nverts(), 4);
    assert_eq!(m.cell_vertices(0), &[0, 1, 2, 3]);
}

#[test]
fn from_parts_checks_incidence() {
    let pts = || PointSet::from_coords(vec![Vec3::zeros(); 4]);
    let err = Volume::from_parts(CellType::Tetrahedron, pts(), vec![0, 1, 2]).unwrap_err();
    assert!(matches!(err, MeshError::InvalidLayout { len: 3, .. }));
    let err = Volume::from_parts(CellType::Tetrahedron, pts(), vec![0, 1, 2, 9]).unwrap_err();
    assert!(matches!(
        err,
        MeshError::InvalidIncidence { corner: 3, vertex: 9, nverts: 4 }
    ));
}

#[test]
#[should_panic(expected = "add_cell")]
fn wrong_cell_arity_panics() {
    let mut m = Volume::hexahedra();
    m.create_points(4);
    m.add_cell(&[0, 1, 2, 3]);
}
