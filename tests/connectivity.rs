use mesh_kernel::prelude::*;

fn single_triangle() -> Triangles {
    let mut m = Triangles::new();
    m.push_point(Vec3::zeros());
    m.push_point(Vec3::x());
    m.push_point(Vec3::y());
    m.add_facet(&[0, 1, 2]);
    m
}

/// Two unit quads sharing the edge 1-4:
///
/// ```text
/// 3---4---5
/// |   |   |
/// 0---1---2
/// ```
fn quad_strip() -> Quads {
    let mut m = Quads::new();
    for j in 0..2 {
        for i in 0..3 {
            m.push_point(Vec3::new(i as f64, j as f64, 0.0));
        }
    }
    m.add_facet(&[0, 1, 4, 3]);
    m.add_facet(&[1, 2, 5, 4]);
    m
}

#[test]
fn lone_triangle_is_all_boundary() {
    let mut m = single_triangle();
    m.connect();
    let adj = m.adjacency();
    for c in 0..3 {
        assert!(adj.is_boundary(c));
        assert_eq!(adj.corners_around_vertex(adj.from(c)).collect::<Vec<_>>(), vec![c]);
    }
    assert_eq!(adj.next(2), 0);
    assert_eq!(adj.prev(0), 2);
    assert_eq!(adj.to(1), 2);
}

#[test]
fn shared_edge_links_opposite_corners() {
    let mut m = quad_strip();
    m.connect();
    let adj = m.adjacency();

    assert_eq!(adj.opposite(1), Some(7));
    assert_eq!(adj.opposite(7), Some(1));
    let nboundary = (0..m.ncorners()).filter(|&c| adj.is_boundary(c)).count();
    assert_eq!(nboundary, 6);

    assert_eq!(adj.corners_around_vertex(1).collect::<Vec<_>>(), vec![4, 1]);
    assert_eq!(adj.vertex_corner(1), Some(4));
    assert_eq!(adj.facet(5), 1);
}

#[test]
fn isolated_vertex_has_no_corner() {
    let mut m = single_triangle();
    m.push_point(Vec3::new(3.0, 3.0, 3.0));
    m.connect();
    let adj = m.adjacency();
    assert_eq!(adj.vertex_corner(3), None);
    assert_eq!(adj.corners_around_vertex(3).count(), 0);
}

#[test]
fn every_corner_lies_on_its_vertex_cycle() {
    let mut m = quad_strip();
    m.connect();
    let adj = m.adjacency();
    for c in 0..m.ncorners() {
        let v = adj.from(c);
        assert!(adj.corners_around_vertex(v).any(|c2| c2 == c));
        assert!(adj.corners_around_vertex(v).all(|c2| adj.from(c2) == v));
    }
}

#[test]
fn building_twice_gives_identical_connectivity() {
    let mut m = quad_strip();
    m.connect();
    let first = m.connectivity().cloned();
    m.disconnect();
    m.connect();
    assert_eq!(m.connectivity().cloned(), first);
    m.connect();
    assert_eq!(m.connectivity().cloned(), first);
}

#[test]
fn compact_removes_deactivated_facets_and_reconnects() {
    let mut m = quad_strip();
    let fid = FacetAttribute::<i32>::new(&m);
    fid.set(1, 7);
    m.connect();
    m.deactivate_facet(0);
    assert!(!m.is_active(0));

    m.compact(true);

    assert!(m.connected());
    assert_eq!(m.nverts(), 4);
    assert_eq!(m.incidence(), &[0, 1, 3, 2]);
    assert_eq!(fid.to_vec(), vec![7]);
    assert!(m.is_active(0));
    let adj = m.adjacency();
    assert!((0..4).all(|c| adj.is_boundary(c)));
}

#[test]
fn compact_keeps_isolated_vertices_when_asked() {
    let mut m = quad_strip();
    m.connect();
    m.deactivate_facet(1);
    m.compact(false);
    assert_eq!(m.nverts(), 6);
    assert_eq!(m.nfacets(), 1);
}

#[test]
fn disconnect_allows_editing_again() {
    let mut m = single_triangle();
    m.connect();
    m.disconnect();
    assert!(m.connectivity().is_none());
    m.push_point(Vec3::zeros());
    assert_eq!(m.nverts(), 4);
}

#[test]
#[should_panic(expected = "surface is connected")]
fn editing_a_connected_surface_panics() {
    let mut m = single_triangle();
    m.connect();
    m.add_facet(&[0, 2, 1]);
}

#[test]
#[should_panic(expected = "not connected")]
fn adjacency_needs_connect() {
    let m = single_triangle();
    let _ = m.adjacency();
}
