//! How a flat corner array is cut into facets.
//!
//! A surface stores one vertex index per corner. The layout says which
//! corners belong to which facet: every facet has `N` corners for
//! [`Fixed<N>`], or the facets are delimited by an offset array for
//! [`Variable`].

use std::fmt::Debug;
use std::ops::Range;

use crate::mesh_error::MeshError;

/// Facet-to-corner mapping of a surface.
pub trait FacetLayout: Debug + Default {
    /// Number of facets described over `ncorners` corners.
    fn nfacets(&self, ncorners: usize) -> usize;

    /// Corners of facet `f`.
    fn corners(&self, f: usize) -> Range<usize>;

    fn facet_size(&self, f: usize) -> usize {
        self.corners(f).len()
    }

    /// Corner index of local vertex `lv` of facet `f`.
    fn corner(&self, f: usize, lv: usize) -> usize {
        let r = self.corners(f);
        assert!(lv < r.len(), "local vertex {lv} out of range for facet {f}");
        r.start + lv
    }

    /// Whether a facet with `size` corners can be added.
    fn accepts(&self, size: usize) -> bool;

    /// Record a new facet of `size` corners appended after the others.
    fn push_facet(&mut self, size: usize);

    /// Drop the facets flagged in `to_kill` (one flag per facet).
    fn retain(&mut self, to_kill: &[bool]);

    /// Check the layout against the corner count.
    fn validate(&self, ncorners: usize) -> Result<(), MeshError>;

    /// Layout described by a facet offset array (`nfacets + 1` entries).
    fn from_facet_offsets(offsets: &[usize], ncorners: usize) -> Result<Self, MeshError>;
}

/// Every facet has exactly `N` corners.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fixed<const N: usize>;

impl<const N: usize> FacetLayout for Fixed<N> {
    fn nfacets(&self, ncorners: usize) -> usize {
        ncorners / N
    }

    fn corners(&self, f: usize) -> Range<usize> {
        f * N..(f + 1) * N
    }

    fn facet_size(&self, _f: usize) -> usize {
        N
    }

    fn corner(&self, f: usize, lv: usize) -> usize {
        debug_assert!(lv < N);
        f * N + lv
    }

    fn accepts(&self, size: usize) -> bool {
        size == N
    }

    fn push_facet(&mut self, size: usize) {
        debug_assert_eq!(size, N);
    }

    fn retain(&mut self, _to_kill: &[bool]) {}

    fn validate(&self, ncorners: usize) -> Result<(), MeshError> {
        if ncorners % N != 0 {
            return Err(MeshError::InvalidLayout {
                len: ncorners,
                details: format!("not a multiple of facet size {N}"),
            });
        }
        Ok(())
    }

    fn from_facet_offsets(offsets: &[usize], ncorners: usize) -> Result<Self, MeshError> {
        Variable::from_offsets(offsets.to_vec(), ncorners)?;
        match offsets.windows(2).position(|w| w[1] - w[0] != N) {
            Some(facet) => Err(MeshError::NonUniformFacets {
                facet,
                expected: N,
                found: offsets[facet + 1] - offsets[facet],
            }),
            None => Ok(Fixed),
        }
    }
}

/// Facets of any size, delimited by `offset[f]..offset[f + 1]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variable {
    offset: Vec<usize>,
}

impl Default for Variable {
    fn default() -> Self {
        Self { offset: vec![0] }
    }
}

impl Variable {
    /// Layout from an explicit offset array, checked against `ncorners`.
    pub fn from_offsets(offset: Vec<usize>, ncorners: usize) -> Result<Self, MeshError> {
        let layout = Self { offset };
        layout.validate(ncorners)?;
        Ok(layout)
    }

    /// Offsets, `nfacets + 1` entries starting at zero.
    pub fn offsets(&self) -> &[usize] {
        &self.offset
    }
}

impl FacetLayout for Variable {
    fn nfacets(&self, _ncorners: usize) -> usize {
        self.offset.len() - 1
    }

    fn corners(&self, f: usize) -> Range<usize> {
        self.offset[f]..self.offset[f + 1]
    }

    fn accepts(&self, _size: usize) -> bool {
        true
    }

    fn push_facet(&mut self, size: usize) {
        let last = self.offset[self.offset.len() - 1];
        self.offset.push(last + size);
    }

    fn retain(&mut self, to_kill: &[bool]) {
        assert_eq!(to_kill.len() + 1, self.offset.len());
        let mut offset = Vec::with_capacity(self.offset.len());
        offset.push(0);
        let mut acc = 0;
        for (f, _) in to_kill.iter().enumerate().filter(|(_, kill)| !**kill) {
            acc += self.offset[f + 1] - self.offset[f];
            offset.push(acc);
        }
        self.offset = offset;
    }

    fn validate(&self, ncorners: usize) -> Result<(), MeshError> {
        let err = |details: String| MeshError::InvalidLayout {
            len: ncorners,
            details,
        };
        match (self.offset.first(), self.offset.last()) {
            (Some(0), Some(&last)) if last == ncorners => {}
            (first, last) => {
                return Err(err(format!(
                    "offsets must run from 0 to {ncorners}, got {first:?}..{last:?}"
                )));
            }
        }
        if let Some(f) = self.offset.windows(2).position(|w| w[0] > w[1]) {
            return Err(err(format!("offsets decrease at facet {f}")));
        }
        Ok(())
    }

    fn from_facet_offsets(offsets: &[usize], ncorners: usize) -> Result<Self, MeshError> {
        Self::from_offsets(offsets.to_vec(), ncorners)
    }
}
