//! Axis-aligned bounding boxes.

use serde::{Deserialize, Serialize};

use super::Vec3;

/// Axis-aligned box in 3D.
///
/// The default box is empty (`min = +inf`, `max = -inf`): it intersects
/// nothing and is the neutral element of [`BBox3::add_box`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BBox3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for BBox3 {
    fn default() -> Self {
        Self {
            min: Vec3::repeat(f64::INFINITY),
            max: Vec3::repeat(f64::NEG_INFINITY),
        }
    }
}

impl BBox3 {
    /// Box spanning exactly `[min, max]`.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point of `points`.
    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Vec3>,
    {
        let mut b = Self::default();
        for p in points {
            b.add_point(p);
        }
        b
    }

    /// True if no point was ever added.
    pub fn is_empty(&self) -> bool {
        (0..3).any(|d| self.min[d] > self.max[d])
    }

    /// Grow the box to contain `p`.
    pub fn add_point(&mut self, p: &Vec3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// Grow the box to contain `other`.
    pub fn add_box(&mut self, other: &BBox3) {
        self.min = self.min.inf(&other.min);
        self.max = self.max.sup(&other.max);
    }

    /// Union of two boxes.
    pub fn union(&self, other: &BBox3) -> BBox3 {
        let mut b = *self;
        b.add_box(other);
        b
    }

    /// Closed-interval overlap test on every axis. Touching boxes intersect.
    pub fn intersects(&self, other: &BBox3) -> bool {
        (0..3).all(|d| self.min[d] <= other.max[d] && other.min[d] <= self.max[d])
    }

    pub fn contains(&self, p: &Vec3) -> bool {
        (0..3).all(|d| self.min[d] <= p[d] && p[d] <= self.max[d])
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths along x, y and z.
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Enlarge by `eps` in every direction.
    pub fn dilate(&mut self, eps: f64) {
        self.min.add_scalar_mut(-eps);
        self.max.add_scalar_mut(eps);
    }
}
