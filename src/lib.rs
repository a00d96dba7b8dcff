#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-kernel
//!
//! mesh-kernel is a small geometry-processing kernel: point sets, polylines,
//! surface meshes (triangles, quads, polygons) and single-type volume meshes,
//! with per-element attributes that follow every edit of their mesh.
//!
//! ## Features
//! - Flat incidence containers: one vertex index per corner, facets cut by a
//!   fixed arity or an offset array.
//! - Shared, type-erased attributes kept in sync on resize and compaction
//!   through weak back-references; dropping the last handle detaches them.
//! - Corner-cycle connectivity for surfaces (boundary detection, walks around
//!   vertices, opposite corners) and half-facet adjacency for volumes.
//! - A flattened bounding-box hierarchy for box queries.
//! - Wavefront `.obj` and Geogram `.geogram` import/export.
//!
//! ## Invariant checking
//! Mutators re-validate their container with [`DebugInvariants`] in debug
//! builds, or in release builds with the `check-invariants` feature.
//! Programmer errors (mutating a connected surface, reading an attribute as
//! the wrong type, deleting a referenced vertex) panic; fallible boundaries
//! return [`MeshError`](mesh_error::MeshError).
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! mesh-kernel = "0.3"
//! # Optional features:
//! # features = ["rayon", "check-invariants"]
//! ```
//!
//! ```
//! use mesh_kernel::prelude::*;
//!
//! let mut m = Triangles::new();
//! for p in [Vec3::zeros(), Vec3::x(), Vec3::y()] {
//!     m.push_point(p);
//! }
//! m.add_facet(&[0, 1, 2]);
//! let area = FacetAttribute::<f64>::new(&m);
//! area.set(0, m.facet_area(0));
//!
//! m.connect();
//! assert!(m.adjacency().is_boundary(0));
//! ```

pub mod data;
pub mod debug_invariants;
pub mod geometry;
pub mod io;
pub mod mesh_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::data::attribute::{
        AttributeOwner, CellAttribute, CellCornerAttribute, CellFacetAttribute, CornerAttribute,
        EdgeAttribute, FacetAttribute, GenericAttribute, NamedAttribute, PointAttribute,
        find_named,
    };
    pub use crate::data::attribute_kind::AttributeKind;
    pub use crate::data::point_set::PointSet;
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::geometry::{BBox3, HBoxes, Vec2, Vec3};
    pub use crate::io::geogram::{
        GeogramPolyLineReader, GeogramReader, GeogramVolumeReader, GeogramWriter,
    };
    pub use crate::io::obj::{ObjReader, ObjWriter};
    pub use crate::io::{
        MeshData, MeshReader, MeshWriter, PolyLineAttributes, SurfaceAttributes, VolumeAttributes,
    };
    pub use crate::mesh_error::MeshError;
    pub use crate::topology::{
        Adjacency, CellType, CellsAdjacency, FacetLayout, HalfEdgeHelper, PolyLine, Polygons,
        Quads, Surface, Triangles, Volume,
    };
}
