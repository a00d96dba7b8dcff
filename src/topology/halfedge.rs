//! Half-edges and half-facet adjacency over volume cells.
//!
//! Half-edges are not stored. A half-edge id `he` encodes
//! `cell * nhalfedges_per_cell + halfedge_offset(lf) + lh`, i.e. the
//! half-edge `lh` of local facet `lf` of a cell, and everything else is
//! derived from the reference-cell tables of [`CellType`].
//!
//! Crossing to a neighbouring cell needs a [`CellsAdjacency`] snapshot,
//! which matches half-facets carrying the same vertices in reverse winding.

use hashbrown::HashMap;

use super::cell_type::CellType;
use super::volume::Volume;
use crate::debug_invariants::DebugInvariants;
use crate::geometry::Vec3;
use crate::mesh_error::MeshError;

/// Half-edge navigation over the cells of a volume.
#[derive(Clone, Copy, Debug)]
pub struct HalfEdgeHelper<'a> {
    m: &'a Volume,
}

impl<'a> HalfEdgeHelper<'a> {
    pub fn new(m: &'a Volume) -> Self {
        Self { m }
    }

    fn cell_type(&self) -> CellType {
        self.m.cell_type()
    }

    pub fn nhalfedges_per_cell(&self) -> usize {
        self.cell_type().nhalfedges()
    }

    pub fn nhalfedges(&self) -> usize {
        self.m.ncells() * self.nhalfedges_per_cell()
    }

    /// Half-edge `lh` of local facet `lf` of `cell`.
    pub fn halfedge(&self, cell: usize, lf: usize, lh: usize) -> usize {
        debug_assert!(lh < self.cell_type().facet_size(lf));
        cell * self.nhalfedges_per_cell() + self.cell_type().halfedge_offset(lf) + lh
    }

    pub fn cell(&self, he: usize) -> usize {
        he / self.nhalfedges_per_cell()
    }

    /// Index of `he` among the half-edges of its cell.
    pub fn cell_halfedge(&self, he: usize) -> usize {
        he % self.nhalfedges_per_cell()
    }

    /// Local facet of `he` in its cell.
    pub fn cell_facet(&self, he: usize) -> usize {
        self.cell_type().decompose(self.cell_halfedge(he)).0
    }

    /// Position of `he` in its facet.
    pub fn facet_halfedge(&self, he: usize) -> usize {
        self.cell_type().decompose(self.cell_halfedge(he)).1
    }

    /// Half-facet id of the facet carrying `he`.
    pub fn facet(&self, he: usize) -> usize {
        self.m.facet(self.cell(he), self.cell_facet(he))
    }

    /// Cell corner `he` starts from.
    pub fn corner(&self, he: usize) -> usize {
        let (lf, lh) = self.cell_type().decompose(self.cell_halfedge(he));
        self.m.facet_corner(self.cell(he), lf, lh)
    }

    pub fn from(&self, he: usize) -> usize {
        self.m.incidence()[self.corner(he)]
    }

    pub fn to(&self, he: usize) -> usize {
        self.from(self.next(he))
    }

    /// Next half-edge around the same facet.
    pub fn next(&self, he: usize) -> usize {
        let (lf, lh) = self.cell_type().decompose(self.cell_halfedge(he));
        let size = self.cell_type().facet_size(lf);
        self.halfedge(self.cell(he), lf, (lh + 1) % size)
    }

    pub fn prev(&self, he: usize) -> usize {
        let (lf, lh) = self.cell_type().decompose(self.cell_halfedge(he));
        let size = self.cell_type().facet_size(lf);
        self.halfedge(self.cell(he), lf, (lh + size - 1) % size)
    }

    /// Edge vector `to - from`.
    pub fn geom(&self, he: usize) -> Vec3 {
        self.m.point(self.to(he)) - self.m.point(self.from(he))
    }

    /// Half-edge of the same cell running the other way along the same
    /// edge, on the neighbouring local facet.
    pub fn opposite_f(&self, he: usize) -> usize {
        let ct = self.cell_type();
        let cell = self.cell(he);
        let (lf, lh) = ct.decompose(self.cell_halfedge(he));
        let size = ct.facet_size(lf);
        let a = ct.facet_vert(lf, lh);
        let b = ct.facet_vert(lf, (lh + 1) % size);
        for lf2 in (0..ct.nfacets()).filter(|&lf2| lf2 != lf) {
            let n2 = ct.facet_size(lf2);
            for lh2 in 0..n2 {
                if ct.facet_vert(lf2, lh2) == b && ct.facet_vert(lf2, (lh2 + 1) % n2) == a {
                    return self.halfedge(cell, lf2, lh2);
                }
            }
        }
        unreachable!("reference {ct} is not closed around half-edge {lh} of facet {lf}")
    }

    /// Half-edge of the neighbouring cell across the facet of `he`, running
    /// the other way; `None` on the boundary.
    pub fn opposite_c(&self, adj: &CellsAdjacency, he: usize) -> Option<usize> {
        let opp = adj.opposite(self.facet(he))?;
        let nf = self.m.nfacets_per_cell();
        let (cell2, lf2) = (opp / nf, opp % nf);
        let (a, b) = (self.from(he), self.to(he));
        (0..self.cell_type().facet_size(lf2))
            .map(|lh2| self.halfedge(cell2, lf2, lh2))
            .find(|&he2| self.from(he2) == b && self.to(he2) == a)
    }
}

/// Neighbour of every half-facet of a volume.
///
/// A snapshot: rebuild it after editing the volume.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellsAdjacency {
    adjacent: Vec<Option<usize>>,
    nfacets_per_cell: usize,
}

impl CellsAdjacency {
    /// Pair half-facets made of the same vertices in reverse winding.
    ///
    /// A half-facet seen with the same winding as a pending one (inverted
    /// or duplicated cells) stays on the boundary.
    pub fn new(m: &Volume) -> Self {
        let nf = m.nfacets_per_cell();
        let mut adjacent = vec![None; m.nfacets()];
        let mut pending: HashMap<[usize; 4], usize> = HashMap::with_capacity(m.nfacets());
        let mut mismatched = 0usize;

        let facet_verts = |c: usize, lf: usize| -> Vec<usize> {
            (0..m.facet_size(lf))
                .map(|lfv| m.facet_vert(c, lf, lfv))
                .collect()
        };

        for c in 0..m.ncells() {
            for lf in 0..nf {
                let verts = facet_verts(c, lf);
                let hf = m.facet(c, lf);
                let key = facet_key(&verts);
                match pending.get(&key) {
                    Some(&other) => {
                        let other_verts = facet_verts(other / nf, other % nf);
                        if reverse_winding(&verts, &other_verts) {
                            adjacent[hf] = Some(other);
                            adjacent[other] = Some(hf);
                            pending.remove(&key);
                        } else {
                            mismatched += 1;
                        }
                    }
                    None => {
                        pending.insert(key, hf);
                    }
                }
            }
        }
        if mismatched > 0 {
            log::warn!("CellsAdjacency: {mismatched} half-facets share vertices without reverse winding");
        }

        let adj = Self {
            adjacent,
            nfacets_per_cell: nf,
        };
        crate::debug_invariants!(adj.validate_invariants(), "CellsAdjacency::new");
        adj
    }

    /// Number of half-facets.
    pub fn len(&self) -> usize {
        self.adjacent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacent.is_empty()
    }

    /// Half-facet facing `hf`, `None` on the boundary.
    pub fn opposite(&self, hf: usize) -> Option<usize> {
        self.adjacent[hf]
    }

    pub fn is_boundary(&self, hf: usize) -> bool {
        self.adjacent[hf].is_none()
    }

    /// Cell across half-facet `hf`.
    pub fn opposite_cell(&self, hf: usize) -> Option<usize> {
        self.adjacent[hf].map(|o| o / self.nfacets_per_cell)
    }

    pub fn nboundary(&self) -> usize {
        self.adjacent.iter().filter(|a| a.is_none()).count()
    }
}

/// Order-independent key of a facet with at most four vertices.
fn facet_key(verts: &[usize]) -> [usize; 4] {
    let mut key = [usize::MAX; 4];
    key[..verts.len()].copy_from_slice(verts);
    key.sort_unstable();
    key
}

/// True if `b` lists the vertices of `a` in the opposite cyclic order.
fn reverse_winding(a: &[usize], b: &[usize]) -> bool {
    let n = a.len();
    if n != b.len() {
        return false;
    }
    let Some(j) = b.iter().position(|&v| v == a[0]) else {
        return false;
    };
    (0..n).all(|k| a[k] == b[(j + n - k) % n])
}

impl DebugInvariants for CellsAdjacency {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "CellsAdjacency");
    }

    fn validate_invariants(&self) -> Result<(), MeshError> {
        for (hf, opp) in self.adjacent.iter().enumerate() {
            if let Some(o) = *opp {
                if o == hf || self.adjacent.get(o).copied().flatten() != Some(hf) {
                    return Err(MeshError::StaleConnectivity(format!(
                        "half-facet {hf} faces {o}, which does not face it back"
                    )));
                }
            }
        }
        Ok(())
    }
}
