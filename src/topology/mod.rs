//! Mesh containers and the adjacency derived from them.
//!
//! - [`polyline`]: points plus independent segments
//! - [`surface`]: points plus facets of fixed or variable size
//! - [`connectivity`]: corner cycles around vertices for connected surfaces
//! - [`volume`]: points plus cells of one [`CellType`]
//! - [`halfedge`]: half-edge ids over cells and half-facet adjacency
//!
//! Containers own their points and expose attribute registries through
//! [`AttributeOwner`](crate::data::attribute::AttributeOwner).

pub mod cell_type;
pub mod connectivity;
pub mod halfedge;
pub mod layout;
pub mod polyline;
pub mod surface;
pub mod volume;

pub use cell_type::CellType;
pub use connectivity::{Adjacency, CornersAroundVertex, SurfaceConnectivity};
pub use halfedge::{CellsAdjacency, HalfEdgeHelper};
pub use layout::{FacetLayout, Fixed, Variable};
pub use polyline::PolyLine;
pub use surface::{Polygons, Quads, Surface, Triangles};
pub use volume::Volume;
