use mesh_kernel::io::geogram::{
    ElementSet, read_geogram, read_geogram_attributes, read_geogram_polyline, read_geogram_volume,
    write_geogram, write_geogram_polyline, write_geogram_volume,
};
use mesh_kernel::io::obj::{read_wavefront_obj, write_wavefront_obj};
use mesh_kernel::prelude::*;
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("mesh_kernel_{}_{name}", std::process::id()))
}

fn tetra_surface() -> Triangles {
    let mut m = Triangles::new();
    for p in [Vec3::zeros(), Vec3::x(), Vec3::y(), Vec3::z()] {
        m.push_point(p);
    }
    for f in [[1, 2, 3], [0, 3, 2], [0, 1, 3], [0, 2, 1]] {
        m.add_facet(&f);
    }
    m
}

#[test]
fn geogram_keeps_vector_and_flag_attributes() {
    let m = tetra_surface();
    let normal = FacetAttribute::<Vec3>::new(&m);
    for f in 0..m.nfacets() {
        normal.set(f, m.facet_normal(f));
    }
    let uv = CornerAttribute::<Vec2>::new(&m);
    uv.set(5, Vec2::new(0.25, 0.75));
    let selected = PointAttribute::<bool>::new(&m);
    selected.set(3, true);
    let attrs = SurfaceAttributes {
        points: vec![selected.named("selected")],
        facets: vec![normal.named("normal")],
        corners: vec![uv.named("uv")],
    };

    let mut buf = Vec::new();
    GeogramWriter::default().write(&mut buf, &m, &attrs).unwrap();

    let contents = read_geogram_attributes(buf.as_slice()).unwrap();
    assert_eq!(contents.size(ElementSet::Vertices), Some(4));
    assert_eq!(contents.size(ElementSet::Facets), Some(4));
    assert_eq!(contents.size(ElementSet::FacetCorners), Some(12));
    assert_eq!(contents.size(ElementSet::Cells), None);

    let back: MeshData<Triangles, _> = GeogramReader.read(buf.as_slice()).unwrap();
    assert_eq!(back.mesh.incidence(), m.incidence());
    let normal_back = find_named::<Vec3>(&back.attributes.facets, "normal").unwrap();
    assert_eq!(normal_back.to_vec(), normal.to_vec());
    let uv_back = find_named::<Vec2>(&back.attributes.corners, "uv").unwrap();
    assert_eq!(uv_back.get(5), Vec2::new(0.25, 0.75));
    let selected_back = find_named::<bool>(&back.attributes.points, "selected").unwrap();
    assert_eq!(selected_back.to_vec(), vec![false, false, false, true]);
}

#[test]
fn wrongly_sized_attribute_is_rejected_on_write() {
    let m = tetra_surface();
    let short = GenericAttribute::<f64>::new(2);
    let attrs = SurfaceAttributes {
        points: vec![short.named("short")],
        ..Default::default()
    };
    let err = GeogramWriter::default()
        .write(&mut Vec::new(), &m, &attrs)
        .unwrap_err();
    assert!(matches!(
        err,
        MeshError::AttributeSizeMismatch { expected: 4, found: 2, .. }
    ));
}

#[test]
fn missing_attribute_is_reported() {
    let m = tetra_surface();
    let mut buf = Vec::new();
    GeogramWriter::default()
        .write(&mut buf, &m, &SurfaceAttributes::default())
        .unwrap();
    let back: MeshData<Triangles, _> = GeogramReader.read(buf.as_slice()).unwrap();
    let err = find_named::<f64>(&back.attributes.points, "heat").unwrap_err();
    assert!(matches!(err, MeshError::MissingAttribute(name) if name == "heat"));
}

#[test]
fn obj_to_geogram_and_back() {
    let text = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nv 2 0.5 0\nf 1 2 3 4\nf 2 5 3\n";
    let obj: MeshData<Polygons, ()> = ObjReader.read(text.as_bytes()).unwrap();

    let mut buf = Vec::new();
    GeogramWriter::default()
        .write(&mut buf, &obj.mesh, &SurfaceAttributes::default())
        .unwrap();
    let back: MeshData<Polygons, _> = GeogramReader.read(buf.as_slice()).unwrap();

    let mut out = Vec::new();
    ObjWriter::default().write(&mut out, &back.mesh, &()).unwrap();
    let text_back = String::from_utf8(out).unwrap();
    assert!(text_back.ends_with("f 1 2 3 4\nf 2 5 3\n"));
}

#[test]
fn files_on_disk() {
    let m = tetra_surface();
    let heat = PointAttribute::<f64>::new(&m);
    heat.set(0, -1.0);
    let attrs = SurfaceAttributes {
        points: vec![heat.named("heat")],
        ..Default::default()
    };

    let geo = temp_path("surface.geogram");
    write_geogram(&geo, &m, &attrs).unwrap();
    let back = read_geogram::<mesh_kernel::topology::Fixed<3>>(&geo).unwrap();
    assert_eq!(back.mesh.nfacets(), 4);
    assert_eq!(
        find_named::<f64>(&back.attributes.points, "heat").unwrap().get(0),
        -1.0
    );

    let obj = temp_path("surface.obj");
    write_wavefront_obj(&obj, &m).unwrap();
    let poly = read_wavefront_obj(&obj).unwrap();
    assert_eq!(poly.incidence(), m.incidence());
    assert_eq!(poly.layout().offsets(), &[0, 3, 6, 9, 12]);

    let mut hexes = Volume::hexahedra();
    for i in 0..8 {
        hexes.push_point(Vec3::new(
            (i & 1) as f64,
            ((i >> 1) & 1) as f64,
            ((i >> 2) & 1) as f64,
        ));
    }
    hexes.add_cell(&[0, 1, 2, 3, 4, 5, 6, 7]);
    let region = CellAttribute::<i32>::with_value(&hexes, 4);
    let vol = temp_path("volume.geogram");
    write_geogram_volume(
        &vol,
        &hexes,
        &VolumeAttributes {
            cells: vec![region.named("region")],
            ..Default::default()
        },
    )
    .unwrap();
    let back = read_geogram_volume(&vol, CellType::Hexahedron).unwrap();
    assert_eq!(back.mesh.cell_vertices(0), hexes.cell_vertices(0));
    assert_eq!(
        find_named::<i32>(&back.attributes.cells, "region").unwrap().to_vec(),
        vec![4]
    );

    for p in [geo, obj, vol] {
        std::fs::remove_file(p).unwrap();
    }
}

#[test]
fn polyline_file_keeps_edges_and_attributes() {
    let mut m = PolyLine::new();
    for i in 0..4 {
        m.push_point(Vec3::new(i as f64, (i * i) as f64, 0.0));
    }
    m.add_chain(&[0, 1, 2, 3], false);
    m.add_edge([3, 0]);
    let id = EdgeAttribute::<i32>::new(&m);
    for e in 0..m.nedges() {
        id.set(e, 10 + e as i32);
    }
    let arc = PointAttribute::<f64>::new(&m);
    arc.set(3, m.length());

    let path = temp_path("polyline.geogram");
    write_geogram_polyline(
        &path,
        &m,
        &PolyLineAttributes {
            points: vec![arc.named("arc")],
            edges: vec![id.named("id")],
        },
    )
    .unwrap();
    let back = read_geogram_polyline(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(back.mesh.nedges(), 4);
    assert_eq!(back.mesh.edge_vertices(3), [3, 0]);
    assert_eq!(back.mesh.length(), m.length());
    assert_eq!(
        find_named::<i32>(&back.attributes.edges, "id").unwrap().to_vec(),
        vec![10, 11, 12, 13]
    );
    assert_eq!(
        find_named::<f64>(&back.attributes.points, "arc").unwrap().get(3),
        m.length()
    );

    // A surface reader sees the same file as bare points.
    let mut buf = Vec::new();
    GeogramWriter::default()
        .write(&mut buf, &m, &PolyLineAttributes::default())
        .unwrap();
    let as_surface: MeshData<Triangles, _> = GeogramReader.read(buf.as_slice()).unwrap();
    assert_eq!((as_surface.mesh.nverts(), as_surface.mesh.nfacets()), (4, 0));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = read_wavefront_obj(temp_path("does_not_exist.obj")).unwrap_err();
    assert!(matches!(err, MeshError::Io(_)));
}
