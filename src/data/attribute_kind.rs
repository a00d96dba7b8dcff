//! Closed set of element types the exchange formats can carry.
//!
//! Attributes may hold any `Clone + Default + 'static` type in memory, but
//! only these kinds survive a round trip through a file.

use std::any::TypeId;

use serde::{Deserialize, Serialize};

use crate::geometry::{Vec2, Vec3};

/// Element type tag of a storable attribute.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum AttributeKind {
    /// `i32`
    Int,
    /// `f64`
    Double,
    /// [`Vec2`]
    Vec2,
    /// [`Vec3`]
    Vec3,
    /// `bool`
    Bool,
}

impl AttributeKind {
    /// Stable label, also used as the element type name on disk.
    pub fn as_str(self) -> &'static str {
        match self {
            AttributeKind::Int => "int",
            AttributeKind::Double => "double",
            AttributeKind::Vec2 => "vec2",
            AttributeKind::Vec3 => "vec3",
            AttributeKind::Bool => "bool",
        }
    }

    /// Parse a kind from its label.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "int" => Some(AttributeKind::Int),
            "double" => Some(AttributeKind::Double),
            "vec2" => Some(AttributeKind::Vec2),
            "vec3" => Some(AttributeKind::Vec3),
            "bool" => Some(AttributeKind::Bool),
            _ => None,
        }
    }

    /// Kind of the Rust element type `T`, if it is storable.
    pub fn of<T: 'static>() -> Option<Self> {
        let id = TypeId::of::<T>();
        if id == TypeId::of::<i32>() {
            Some(AttributeKind::Int)
        } else if id == TypeId::of::<f64>() {
            Some(AttributeKind::Double)
        } else if id == TypeId::of::<Vec2>() {
            Some(AttributeKind::Vec2)
        } else if id == TypeId::of::<Vec3>() {
            Some(AttributeKind::Vec3)
        } else if id == TypeId::of::<bool>() {
            Some(AttributeKind::Bool)
        } else {
            None
        }
    }

    /// Bytes per element in the binary exchange format.
    pub fn element_size(self) -> usize {
        match self {
            AttributeKind::Int => 4,
            AttributeKind::Double => 8,
            AttributeKind::Vec2 => 16,
            AttributeKind::Vec3 => 24,
            AttributeKind::Bool => 1,
        }
    }
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::attribute::{AttributeStore, SharedContainer, shared};

    const ALL: [AttributeKind; 5] = [
        AttributeKind::Int,
        AttributeKind::Double,
        AttributeKind::Vec2,
        AttributeKind::Vec3,
        AttributeKind::Bool,
    ];

    #[test]
    fn labels_parse_back() {
        for k in ALL {
            assert_eq!(AttributeKind::parse(k.as_str()), Some(k));
        }
        assert_eq!(AttributeKind::parse("float"), None);
    }

    #[test]
    fn detects_rust_types() {
        assert_eq!(AttributeKind::of::<i32>(), Some(AttributeKind::Int));
        assert_eq!(AttributeKind::of::<Vec3>(), Some(AttributeKind::Vec3));
        assert_eq!(AttributeKind::of::<u64>(), None);
        assert_eq!(AttributeKind::of::<String>(), None);
    }

    #[test]
    fn containers_report_their_kind() {
        let stores: [SharedContainer; 5] = [
            shared(AttributeStore::<i32>::new(3)),
            shared(AttributeStore::<f64>::new(3)),
            shared(AttributeStore::<Vec2>::new(3)),
            shared(AttributeStore::<Vec3>::new(3)),
            shared(AttributeStore::<bool>::new(3)),
        ];
        for (k, c) in ALL.into_iter().zip(stores) {
            assert_eq!(c.borrow().kind(), Some(k));
        }
        assert_eq!(shared(AttributeStore::<u8>::new(1)).borrow().kind(), None);
    }

    #[test]
    fn element_sizes_match_memory_layout() {
        assert_eq!(AttributeKind::Int.element_size(), std::mem::size_of::<i32>());
        assert_eq!(AttributeKind::Double.element_size(), std::mem::size_of::<f64>());
        assert_eq!(AttributeKind::Vec2.element_size(), std::mem::size_of::<Vec2>());
        assert_eq!(AttributeKind::Vec3.element_size(), std::mem::size_of::<Vec3>());
        assert_eq!(AttributeKind::Bool.element_size(), 1);
    }

    #[test]
    fn serde_uses_variant_names() {
        let json = serde_json::to_string(&AttributeKind::Vec3).unwrap();
        assert_eq!(json, "\"Vec3\"");
    }
}
