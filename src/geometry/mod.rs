//! Geometry for mesh-kernel.
//!
//! Vector types come from `nalgebra`. This module adds axis-aligned boxes,
//! the static box hierarchy used for spatial queries, and the few
//! per-element measures (barycenters, normals, areas) the containers expose.

pub mod bbox;
pub mod hboxes;
pub mod primitives;

pub use bbox::BBox3;
pub use hboxes::HBoxes;

/// 3D point / vector.
pub type Vec3 = nalgebra::Vector3<f64>;
/// 2D vector (e.g. texture coordinates carried as attributes).
pub type Vec2 = nalgebra::Vector2<f64>;

// The binary exchange format casts coordinate slices to raw `f64` arrays.
static_assertions::assert_eq_size!(Vec3, [f64; 3]);
static_assertions::assert_eq_size!(Vec2, [f64; 2]);
