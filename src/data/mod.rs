//! Data module: point coordinates and per-element attributes.

pub mod attribute;
pub mod attribute_kind;
pub mod point_set;

pub use attribute::{
    Attribute, AttributeContainer, AttributeOwner, AttributeRegistry, AttributeStore,
    CellAttribute, CellCornerAttribute, CellFacetAttribute, CornerAttribute, FacetAttribute,
    GenericAttribute, NamedAttribute, PointAttribute, SharedContainer, compaction_map,
    compose_maps, find_named, shared, take_named,
};
pub use attribute_kind::AttributeKind;
pub use point_set::PointSet;
