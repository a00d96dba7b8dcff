//! Ordered vertex coordinates with attached per-vertex attributes.

use std::ops::{Index, IndexMut};

use super::attribute::{AttributeOwner, AttributeRegistry, category, compress_vec};
use crate::debug_invariants::DebugInvariants;
use crate::geometry::{BBox3, Vec3};
use crate::mesh_error::MeshError;

/// Vertex positions of a mesh; index `v` is vertex `v`.
///
/// Growing or compacting the set cascades into every live
/// [`PointAttribute`](super::attribute::PointAttribute).
#[derive(Debug, Default)]
pub struct PointSet {
    data: Vec<Vec3>,
    attr: AttributeRegistry,
}

impl PointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point set holding `coords`.
    pub fn from_coords(coords: Vec<Vec3>) -> Self {
        Self {
            data: coords,
            attr: AttributeRegistry::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append `n` points at the origin; returns the index of the first.
    pub fn create_points(&mut self, n: usize) -> usize {
        let first = self.data.len();
        self.resize(first + n);
        first
    }

    /// Append one point; returns its index.
    pub fn push(&mut self, p: Vec3) -> usize {
        let v = self.create_points(1);
        self.data[v] = p;
        v
    }

    /// Grow with origin points or truncate, resizing point attributes.
    pub fn resize(&mut self, n: usize) {
        self.data.resize(n, Vec3::zeros());
        self.attr.resize(n);
    }

    /// Relocate points and their attributes per `old2new`.
    pub fn compress(&mut self, old2new: &[Option<usize>]) {
        compress_vec(&mut self.data, old2new);
        self.attr.compress(old2new);
        crate::debug_invariants!(self.validate_invariants(), "PointSet::compress");
    }

    pub fn as_slice(&self) -> &[Vec3] {
        &self.data
    }

    /// Mutable coordinates. The vertex count cannot change through this.
    pub fn as_mut_slice(&mut self) -> &mut [Vec3] {
        &mut self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Vec3> {
        self.data.iter()
    }

    pub fn bbox(&self) -> BBox3 {
        BBox3::from_points(&self.data)
    }

    /// Registry of point attributes.
    pub fn attributes(&self) -> &AttributeRegistry {
        &self.attr
    }
}

impl Index<usize> for PointSet {
    type Output = Vec3;

    fn index(&self, v: usize) -> &Vec3 {
        &self.data[v]
    }
}

impl IndexMut<usize> for PointSet {
    fn index_mut(&mut self, v: usize) -> &mut Vec3 {
        &mut self.data[v]
    }
}

impl<'a> IntoIterator for &'a PointSet {
    type Item = &'a Vec3;
    type IntoIter = std::slice::Iter<'a, Vec3>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl AttributeOwner<category::Points> for PointSet {
    fn registry(&self) -> &AttributeRegistry {
        &self.attr
    }

    fn element_count(&self) -> usize {
        self.data.len()
    }
}

impl DebugInvariants for PointSet {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "PointSet");
    }

    fn validate_invariants(&self) -> Result<(), MeshError> {
        self.attr.check_lengths("points", self.data.len())
    }
}
