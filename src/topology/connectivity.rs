//! Corner cycles around vertices, derived from surface incidence.
//!
//! `connect()` caches, for every corner, its facet and the next corner in
//! a cyclic list of all corners sharing the same vertex, plus one corner
//! per vertex to enter that cycle. Nothing else is stored: there is no
//! opposite-corner pointer. [`Adjacency::opposite`] finds the corner across
//! an edge by walking a cycle and comparing vertex pairs.
//!
//! While connected the incidence is frozen. Facets to remove are flagged
//! with [`Surface::deactivate_facet`] and dropped in one pass by
//! [`Surface::compact`], which reconnects afterwards.

use super::layout::FacetLayout;
use super::surface::Surface;
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshError;

/// Cached adjacency of a surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurfaceConnectivity {
    v2c: Vec<Option<usize>>,
    c2f: Vec<usize>,
    c2c: Vec<usize>,
    active: Vec<bool>,
}

impl SurfaceConnectivity {
    /// Build from the incidence of `m` in O(V + C).
    ///
    /// The cycle of a vertex with corners `c1 < c2 < ... < ck` is
    /// `ck -> c(k-1) -> ... -> c1 -> ck`, and the vertex enters it at `ck`.
    /// An isolated vertex has no corner.
    pub(crate) fn build<L: FacetLayout>(m: &Surface<L>) -> Self {
        let incidence = m.incidence();
        let mut c2f = vec![0; incidence.len()];
        let mut v2c = vec![None; m.nverts()];
        for f in 0..m.nfacets() {
            for c in m.corners(f) {
                c2f[c] = f;
                v2c[incidence[c]] = Some(c);
            }
        }
        let mut c2c = vec![0; incidence.len()];
        for (c, &v) in incidence.iter().enumerate() {
            if let Some(prev) = v2c[v].replace(c) {
                c2c[c] = prev;
            }
        }
        Self {
            v2c,
            c2f,
            c2c,
            active: vec![true; m.nfacets()],
        }
    }

    /// One corner incident to `v`, `None` for an isolated vertex.
    pub fn v2c(&self, v: usize) -> Option<usize> {
        self.v2c[v]
    }

    /// Facet of corner `c`.
    pub fn c2f(&self, c: usize) -> usize {
        self.c2f[c]
    }

    /// Next corner around the vertex of `c`.
    pub fn c2c(&self, c: usize) -> usize {
        self.c2c[c]
    }

    pub fn is_active(&self, f: usize) -> bool {
        self.active[f]
    }

    /// Number of facets flagged for deletion.
    pub fn ninactive(&self) -> usize {
        self.active.iter().filter(|a| !**a).count()
    }

    pub(crate) fn check_sizes(
        &self,
        nverts: usize,
        nfacets: usize,
        ncorners: usize,
    ) -> Result<(), MeshError> {
        let sizes = [
            ("vertices", self.v2c.len(), nverts),
            ("corners", self.c2f.len(), ncorners),
            ("corner cycles", self.c2c.len(), ncorners),
            ("active flags", self.active.len(), nfacets),
        ];
        for (what, found, expected) in sizes {
            if found != expected {
                return Err(MeshError::StaleConnectivity(format!(
                    "{found} {what} cached, mesh has {expected}"
                )));
            }
        }
        Ok(())
    }
}

impl DebugInvariants for SurfaceConnectivity {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "SurfaceConnectivity");
    }

    /// Every cycle closes and every vertex entry point lies on a valid corner.
    fn validate_invariants(&self) -> Result<(), MeshError> {
        let nc = self.c2c.len();
        if let Some(c) = self.c2c.iter().position(|&next| next >= nc) {
            return Err(MeshError::StaleConnectivity(format!(
                "corner {c} links outside {nc} corners"
            )));
        }
        for (v, start) in self.v2c.iter().enumerate() {
            let Some(start) = *start else { continue };
            if start >= nc {
                return Err(MeshError::StaleConnectivity(format!(
                    "vertex {v} enters at corner {start} of {nc}"
                )));
            }
            let mut c = self.c2c[start];
            let mut steps = 1;
            while c != start {
                c = self.c2c[c];
                steps += 1;
                if steps > nc {
                    return Err(MeshError::StaleConnectivity(format!(
                        "cycle of vertex {v} does not close"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl<L: FacetLayout> Surface<L> {
    /// Build and cache the connectivity. Rebuilds from scratch when already
    /// connected, which reactivates every facet.
    pub fn connect(&mut self) {
        let conn = SurfaceConnectivity::build(self);
        crate::debug_invariants!(conn.validate_invariants(), "Surface::connect");
        log::debug!(
            "connect: {} vertices, {} facets, {} corners",
            self.nverts(),
            self.nfacets(),
            self.ncorners()
        );
        self.conn = Some(conn);
    }

    /// Drop the cached connectivity, discarding deactivation flags.
    pub fn disconnect(&mut self) {
        self.conn = None;
    }

    pub fn connected(&self) -> bool {
        self.conn.is_some()
    }

    pub fn connectivity(&self) -> Option<&SurfaceConnectivity> {
        self.conn.as_ref()
    }

    /// Traversal view over the cached connectivity.
    ///
    /// # Panics
    /// If the surface is not connected.
    pub fn adjacency(&self) -> Adjacency<'_, L> {
        match &self.conn {
            Some(conn) => Adjacency::new(self, conn),
            None => panic!("adjacency: surface is not connected; call connect() first"),
        }
    }

    fn conn_mut(&mut self, op: &str) -> &mut SurfaceConnectivity {
        match &mut self.conn {
            Some(conn) => conn,
            None => panic!("{op}: surface is not connected"),
        }
    }

    /// Flag facet `f` for deletion by the next [`Surface::compact`].
    pub fn deactivate_facet(&mut self, f: usize) {
        self.conn_mut("deactivate_facet").active[f] = false;
    }

    /// # Panics
    /// If the surface is not connected.
    pub fn is_active(&self, f: usize) -> bool {
        match &self.conn {
            Some(conn) => conn.is_active(f),
            None => panic!("is_active: surface is not connected"),
        }
    }

    /// Delete deactivated facets and reconnect.
    ///
    /// Snapshots the active flags, disconnects, deletes the inactive facets,
    /// optionally deletes vertices left without facets, then reconnects.
    /// Does nothing on a disconnected surface.
    pub fn compact(&mut self, delete_isolated_vertices: bool) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        let to_kill: Vec<bool> = conn.active.iter().map(|a| !a).collect();
        let ninactive = conn.ninactive();
        self.delete_facets(&to_kill);
        if delete_isolated_vertices {
            self.delete_isolated_vertices();
        }
        log::debug!("compact: removed {ninactive} facets");
        self.connect();
    }
}

/// Traversal helpers over a connected surface.
///
/// Corners are addressed by their index in the incidence array. Inactive
/// facets are still traversed.
#[derive(Debug)]
pub struct Adjacency<'a, L: FacetLayout> {
    m: &'a Surface<L>,
    conn: &'a SurfaceConnectivity,
}

impl<L: FacetLayout> Clone for Adjacency<'_, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<L: FacetLayout> Copy for Adjacency<'_, L> {}

impl<'a, L: FacetLayout> Adjacency<'a, L> {
    /// View over `m` with connectivity `conn`, which must have been built
    /// from `m`'s current incidence.
    pub fn new(m: &'a Surface<L>, conn: &'a SurfaceConnectivity) -> Self {
        debug_assert!(
            conn.check_sizes(m.nverts(), m.nfacets(), m.ncorners())
                .is_ok()
        );
        Self { m, conn }
    }

    pub fn facet(&self, c: usize) -> usize {
        self.conn.c2f(c)
    }

    pub fn vertex_corner(&self, v: usize) -> Option<usize> {
        self.conn.v2c(v)
    }

    pub fn next_around_vertex(&self, c: usize) -> usize {
        self.conn.c2c(c)
    }

    /// Every corner on vertex `v`, following the cycle once.
    pub fn corners_around_vertex(&self, v: usize) -> CornersAroundVertex<'a> {
        let start = self.conn.v2c(v);
        CornersAroundVertex {
            conn: self.conn,
            start,
            current: start,
        }
    }

    /// Vertex of corner `c`.
    pub fn from(&self, c: usize) -> usize {
        self.m.incidence()[c]
    }

    /// Vertex of the corner following `c` in its facet.
    pub fn to(&self, c: usize) -> usize {
        self.from(self.next(c))
    }

    /// Next corner in the facet of `c`, wrapping around.
    pub fn next(&self, c: usize) -> usize {
        let r = self.m.corners(self.facet(c));
        if c + 1 == r.end { r.start } else { c + 1 }
    }

    /// Previous corner in the facet of `c`, wrapping around.
    pub fn prev(&self, c: usize) -> usize {
        let r = self.m.corners(self.facet(c));
        if c == r.start { r.end - 1 } else { c - 1 }
    }

    /// Corner whose edge runs `to(c) -> from(c)`, or `None` on the boundary.
    pub fn opposite(&self, c: usize) -> Option<usize> {
        let (a, b) = (self.from(c), self.to(c));
        self.corners_around_vertex(b)
            .find(|&c2| self.to(c2) == a)
    }

    pub fn is_boundary(&self, c: usize) -> bool {
        self.opposite(c).is_none()
    }
}

/// Iterator over the corner cycle of one vertex.
#[derive(Clone, Debug)]
pub struct CornersAroundVertex<'a> {
    conn: &'a SurfaceConnectivity,
    start: Option<usize>,
    current: Option<usize>,
}

impl Iterator for CornersAroundVertex<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let c = self.current?;
        let next = self.conn.c2c(c);
        self.current = if Some(next) == self.start { None } else { Some(next) };
        Some(c)
    }
}
