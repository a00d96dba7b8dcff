//! Static bounding-box hierarchy.
//!
//! `HBoxes` stores an implicit complete binary tree in a flat array. The
//! input boxes are the leaves, kept at positions `[offset, offset + n)` in a
//! spatially sorted order; node `i` has children `2i + 1` and `2i + 2`, and
//! every internal node holds the union of the children that exist.
//!
//! The hierarchy is built once from a snapshot of boxes and is read-only
//! afterwards. Rebuild it wholesale when the input changes.
//!
//! Both build and query use explicit stacks, so deep inputs never recurse.

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshError;

use super::Vec3;
use super::bbox::BBox3;

/// Static BVH over a list of boxes.
#[derive(Clone, Debug, Default)]
pub struct HBoxes {
    tree: Vec<BBox3>,
    offset: usize,
    tree_pos_to_org: Vec<usize>,
}

impl HBoxes {
    /// Build the hierarchy over `boxes`.
    ///
    /// Leaf order: the whole index range is sorted by decreasing box center
    /// along one axis, then split at `org + 2^⌊log2(len - 1)⌋` and each half
    /// re-sorted the same way until ranges hold two boxes or fewer. The axis
    /// is the one of greatest spread in the bounding box of *all* centers and
    /// is the same at every level.
    pub fn new(boxes: &[BBox3]) -> Self {
        let n = boxes.len();
        if n == 0 {
            return Self::default();
        }

        let centers: Vec<Vec3> = boxes.iter().map(BBox3::center).collect();
        let axis = split_axis(&centers);
        let mut order: Vec<usize> = (0..n).collect();

        let mut ranges = vec![(0usize, n)];
        while let Some((org, dest)) = ranges.pop() {
            order[org..dest]
                .sort_by(|&a, &b| centers[b][axis].total_cmp(&centers[a][axis]));
            if dest - org <= 2 {
                continue;
            }
            let m = org + (1usize << (dest - org - 1).ilog2());
            ranges.push((m, dest));
            ranges.push((org, m));
        }

        let offset = (1usize << (1 + n.next_power_of_two().trailing_zeros())) - 1;
        let mut tree = vec![BBox3::default(); offset + n];
        for (pos, &org) in order.iter().enumerate() {
            tree[offset + pos] = boxes[org];
        }
        for i in (0..offset).rev() {
            for son in [2 * i + 1, 2 * i + 2] {
                if son < tree.len() {
                    let child = tree[son];
                    tree[i].add_box(&child);
                }
            }
        }

        log::debug!(
            "HBoxes: {n} boxes, split axis {axis}, offset {offset}, {} nodes",
            tree.len()
        );

        let hierarchy = Self {
            tree,
            offset,
            tree_pos_to_org: order,
        };
        crate::debug_invariants!(hierarchy.validate_invariants(), "HBoxes::new");
        hierarchy
    }

    /// Number of indexed boxes.
    pub fn len(&self) -> usize {
        self.tree_pos_to_org.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree_pos_to_org.is_empty()
    }

    /// Position of the first leaf in the flat tree: `2^(1+⌈log2 n⌉) - 1`.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bounding box of every indexed box; empty when nothing is indexed.
    pub fn root_box(&self) -> BBox3 {
        self.tree.first().copied().unwrap_or_default()
    }

    /// Indices (into the construction slice) of every box intersecting `b`.
    ///
    /// Depth-first from the root; a subtree is pruned as soon as its node
    /// box misses `b`. Results come in leaf order, not input order.
    pub fn intersect(&self, b: &BBox3) -> Vec<usize> {
        let mut primitives = Vec::new();
        if self.tree.is_empty() {
            return primitives;
        }
        let mut stack = vec![0usize];
        while let Some(node) = stack.pop() {
            if !self.tree[node].intersects(b) {
                continue;
            }
            if node >= self.offset {
                primitives.push(self.tree_pos_to_org[node - self.offset]);
                continue;
            }
            for son in [2 * node + 2, 2 * node + 1] {
                if son < self.tree.len() {
                    stack.push(son);
                }
            }
        }
        primitives
    }

    /// Run [`HBoxes::intersect`] for every query in parallel.
    #[cfg(feature = "rayon")]
    pub fn intersect_many(&self, queries: &[BBox3]) -> Vec<Vec<usize>> {
        use rayon::prelude::*;
        queries.par_iter().map(|q| self.intersect(q)).collect()
    }
}

/// Axis of largest spread among `centers`; ties keep z, then the first of x/y.
fn split_axis(centers: &[Vec3]) -> usize {
    let extent = BBox3::from_points(centers).extent();
    let mut dim = 2;
    for d in 0..2 {
        if extent[d] > extent[dim] {
            dim = d;
        }
    }
    dim
}

impl DebugInvariants for HBoxes {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "HBoxes");
    }

    fn validate_invariants(&self) -> Result<(), MeshError> {
        let n = self.tree_pos_to_org.len();
        if n == 0 {
            return if self.tree.is_empty() {
                Ok(())
            } else {
                Err(MeshError::InvalidHierarchy("nodes without leaves".into()))
            };
        }
        if self.tree.len() != self.offset + n {
            return Err(MeshError::InvalidHierarchy(format!(
                "{} nodes for offset {} and {n} leaves",
                self.tree.len(),
                self.offset
            )));
        }
        let mut seen = vec![false; n];
        for &org in &self.tree_pos_to_org {
            if org >= n || std::mem::replace(&mut seen[org], true) {
                return Err(MeshError::InvalidHierarchy(format!(
                    "leaf order is not a permutation (index {org})"
                )));
            }
        }
        for i in 0..self.offset {
            for son in [2 * i + 1, 2 * i + 2] {
                if son < self.tree.len() && self.tree[i].union(&self.tree[son]) != self.tree[i] {
                    return Err(MeshError::InvalidHierarchy(format!(
                        "node {i} does not contain child {son}"
                    )));
                }
            }
        }
        Ok(())
    }
}
