use mesh_kernel::prelude::*;

/// Fan of three triangles around vertex 0 plus one isolated vertex (4).
fn fan() -> Triangles {
    let mut m = Triangles::new();
    for p in [
        Vec3::zeros(),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(-1.0, 0.0, 0.0),
        Vec3::new(5.0, 5.0, 5.0),
    ] {
        m.push_point(p);
    }
    m.add_facet(&[0, 1, 2]);
    m.add_facet(&[0, 2, 3]);
    m.add_facet(&[0, 3, 1]);
    m
}

#[test]
fn delete_facets_compacts_facet_and_corner_attributes() {
    let mut m = fan();
    let fid = FacetAttribute::<i32>::new(&m);
    let cid = CornerAttribute::<usize>::new(&m);
    for f in 0..m.nfacets() {
        fid.set(f, 10 * f as i32);
    }
    for c in 0..m.ncorners() {
        cid.set(c, c);
    }

    m.delete_facets(&[false, true, false]);

    assert_eq!(m.nfacets(), 2);
    assert_eq!(m.incidence(), &[0, 1, 2, 0, 3, 1]);
    assert_eq!(fid.to_vec(), vec![0, 20]);
    assert_eq!(cid.to_vec(), vec![0, 1, 2, 6, 7, 8]);
    assert_eq!(m.nverts(), 5);
}

#[test]
fn empty_mask_is_a_no_op() {
    let mut m = fan();
    let fid = FacetAttribute::<i32>::new(&m);
    let cid = CornerAttribute::<usize>::new(&m);
    let first = m.create_facets(2);
    assert_eq!(first, 3);
    assert_eq!(m.facet_vertices(4), &[0, 0, 0]);
    for f in 0..m.nfacets() {
        fid.set(f, 10 * f as i32 + 1);
    }
    for c in 0..m.ncorners() {
        cid.set(c, 100 + c);
    }
    let before = m.incidence().to_vec();
    let (facets_before, corners_before) = (fid.to_vec(), cid.to_vec());

    m.delete_facets(&[false; 5]);

    assert_eq!(m.incidence(), before.as_slice());
    assert_eq!((m.nfacets(), m.ncorners(), m.nverts()), (5, 15, 5));
    assert_eq!(fid.to_vec(), facets_before);
    assert_eq!(cid.to_vec(), corners_before);
    assert_eq!(fid.len(), 5);
}

#[test]
fn polygons_mix_facet_sizes() {
    let mut m = Polygons::new();
    m.create_points(6);
    m.add_facet(&[0, 1, 2, 3]);
    m.add_facet(&[3, 4, 5]);
    m.create_facets(1, 5);
    assert_eq!(m.ncorners(), 12);
    assert_eq!(m.corners(1), 4..7);
    assert_eq!(m.facet_size(2), 5);

    m.delete_facets(&[true, false, false]);
    assert_eq!(m.facet_vertices(0), &[3, 4, 5]);
    assert_eq!(m.corners(1), 3..8);
}

#[test]
fn delete_vertices_renumbers_and_follows_point_attributes() {
    let mut m = fan();
    let tag = PointAttribute::<u8>::new(&m);
    tag.set(3, 3);
    m.delete_facets(&[false, true, true]);
    m.delete_vertices(&[false, false, false, true, true]);
    assert_eq!(m.nverts(), 3);
    assert_eq!(m.incidence(), &[0, 1, 2]);
    assert_eq!(tag.to_vec(), vec![0, 0, 0]);
}

#[test]
fn delete_isolated_vertices_drops_unreferenced() {
    let mut m = fan();
    m.delete_isolated_vertices();
    assert_eq!(m.nverts(), 4);
    assert_eq!(m.incidence(), &[0, 1, 2, 0, 2, 3, 0, 3, 1]);
}

#[test]
fn try_delete_referenced_vertex_reports_and_keeps_mesh() {
    let mut m = fan();
    let err = m
        .try_delete_vertices(&[false, false, true, false, false])
        .unwrap_err();
    assert!(matches!(
        err,
        MeshError::VertexStillReferenced { vertex: 2, element: 0 }
    ));
    assert_eq!(m.nverts(), 5);
    assert_eq!(m.nfacets(), 3);
}

#[test]
#[should_panic(expected = "delete_vertices")]
fn delete_referenced_vertex_panics() {
    let mut m = fan();
    m.delete_vertices(&[true, false, false, false, false]);
}

#[test]
#[should_panic(expected = "cannot hold a facet of 4 vertices")]
fn fixed_layout_rejects_wrong_arity() {
    let mut m = fan();
    m.add_facet(&[0, 1, 2, 3]);
}

#[test]
fn facet_geometry() {
    let m = fan();
    assert!((m.facet_area(0) - 0.5).abs() < 1e-12);
    let n = m.facet_normal(0);
    assert!((n - Vec3::z()).norm() < 1e-12);
    let b = m.facet_bbox(1);
    assert_eq!(b.min, Vec3::new(-1.0, 0.0, 0.0));
    assert_eq!(b.max, Vec3::new(0.0, 1.0, 0.0));
}
