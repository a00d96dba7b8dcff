//! Polylines: points joined by independent segments.
//!
//! A [`PolyLine`] stores two vertex indices per edge in one flat array, so
//! corner `2 * e + lv` holds end `lv` of edge `e`. Edges need not chain; a
//! polyline may hold several open or closed curves, or loose segments.

use crate::data::attribute::{AttributeOwner, AttributeRegistry, category, compaction_map};
use crate::data::point_set::PointSet;
use crate::debug_invariants::DebugInvariants;
use crate::geometry::{BBox3, Vec3};
use crate::mesh_error::MeshError;

/// Points plus segments between them.
#[derive(Debug, Default)]
pub struct PolyLine {
    points: PointSet,
    edges: Vec<usize>,
    attr_edges: AttributeRegistry,
}

impl PolyLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty polyline over existing points.
    pub fn with_points(points: PointSet) -> Self {
        Self {
            points,
            edges: Vec::new(),
            attr_edges: AttributeRegistry::new(),
        }
    }

    /// Polyline from a flat list of edge ends, checking its length and
    /// vertex range.
    pub fn from_parts(points: PointSet, incidence: Vec<usize>) -> Result<Self, MeshError> {
        let m = Self {
            edges: incidence,
            ..Self::with_points(points)
        };
        m.check_incidence()?;
        Ok(m)
    }

    pub fn nverts(&self) -> usize {
        self.points.len()
    }

    pub fn nedges(&self) -> usize {
        self.edges.len() / 2
    }

    /// Vertex at end `lv` (0 or 1) of edge `e`.
    pub fn vert(&self, e: usize, lv: usize) -> usize {
        debug_assert!(lv < 2);
        self.edges[2 * e + lv]
    }

    pub fn set_vert(&mut self, e: usize, lv: usize, v: usize) {
        debug_assert!(lv < 2);
        self.edges[2 * e + lv] = v;
    }

    pub fn edge_vertices(&self, e: usize) -> [usize; 2] {
        [self.edges[2 * e], self.edges[2 * e + 1]]
    }

    pub fn incidence(&self) -> &[usize] {
        &self.edges
    }

    pub fn points(&self) -> &PointSet {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut PointSet {
        &mut self.points
    }

    pub fn point(&self, v: usize) -> &Vec3 {
        &self.points[v]
    }

    pub fn create_points(&mut self, n: usize) -> usize {
        self.points.create_points(n)
    }

    pub fn push_point(&mut self, p: Vec3) -> usize {
        self.points.push(p)
    }

    pub fn edge_attributes(&self) -> &AttributeRegistry {
        &self.attr_edges
    }

    /// Append `n` edges on vertex 0; returns the first new edge index.
    pub fn create_edges(&mut self, n: usize) -> usize {
        let first = self.nedges();
        self.edges.resize(self.edges.len() + 2 * n, 0);
        self.attr_edges.resize(self.nedges());
        first
    }

    pub fn add_edge(&mut self, [a, b]: [usize; 2]) -> usize {
        let e = self.nedges();
        self.edges.extend_from_slice(&[a, b]);
        self.attr_edges.resize(self.nedges());
        e
    }

    /// Chain `verts` into `verts.len() - 1` consecutive edges, closing the
    /// loop back to the first vertex when `closed`. Returns the first new
    /// edge index.
    pub fn add_chain(&mut self, verts: &[usize], closed: bool) -> usize {
        let first = self.nedges();
        for w in verts.windows(2) {
            self.edges.extend_from_slice(w);
        }
        if let (true, [head, .., tail]) = (closed, verts) {
            self.edges.extend_from_slice(&[*tail, *head]);
        }
        self.attr_edges.resize(self.nedges());
        first
    }

    /// Delete the edges flagged in `to_kill`, keeping survivors in order.
    pub fn delete_edges(&mut self, to_kill: &[bool]) {
        let ne = self.nedges();
        assert_eq!(
            to_kill.len(),
            ne,
            "delete_edges: mask has {} entries for {ne} edges",
            to_kill.len()
        );
        if !to_kill.contains(&true) {
            return;
        }
        let mut kept = 0;
        for e in (0..ne).filter(|&e| !to_kill[e]) {
            self.edges.copy_within(2 * e..2 * e + 2, 2 * kept);
            kept += 1;
        }
        self.edges.truncate(2 * kept);
        self.attr_edges.compress(&compaction_map(to_kill));
        crate::debug_invariants!(self.validate_invariants(), "PolyLine::delete_edges");
    }

    /// Delete the vertices flagged in `to_kill` and renumber the edges.
    ///
    /// # Panics
    /// If a surviving edge still uses a deleted vertex.
    pub fn delete_vertices(&mut self, to_kill: &[bool]) {
        if let Err(e) = self.try_delete_vertices(to_kill) {
            panic!("delete_vertices: {e}");
        }
    }

    /// Fallible [`PolyLine::delete_vertices`]; leaves the polyline untouched
    /// on error.
    pub fn try_delete_vertices(&mut self, to_kill: &[bool]) -> Result<(), MeshError> {
        assert_eq!(
            to_kill.len(),
            self.nverts(),
            "delete_vertices: mask has {} entries for {} vertices",
            to_kill.len(),
            self.nverts()
        );
        if let Some(corner) = self.edges.iter().position(|&v| to_kill[v]) {
            return Err(MeshError::VertexStillReferenced {
                vertex: self.edges[corner],
                element: corner / 2,
            });
        }
        let old2new = compaction_map(to_kill);
        for v in &mut self.edges {
            match old2new[*v] {
                Some(n) => *v = n,
                None => unreachable!("vertex {v} checked as kept"),
            }
        }
        self.points.compress(&old2new);
        crate::debug_invariants!(self.validate_invariants(), "PolyLine::delete_vertices");
        Ok(())
    }

    pub fn delete_isolated_vertices(&mut self) {
        let mut to_kill = vec![true; self.nverts()];
        for &v in &self.edges {
            to_kill[v] = false;
        }
        self.delete_vertices(&to_kill);
    }

    /// Vector from end 0 to end 1 of edge `e`.
    pub fn edge_vector(&self, e: usize) -> Vec3 {
        let [a, b] = self.edge_vertices(e);
        self.points[b] - self.points[a]
    }

    pub fn edge_length(&self, e: usize) -> f64 {
        self.edge_vector(e).norm()
    }

    /// Sum of all edge lengths.
    pub fn length(&self) -> f64 {
        (0..self.nedges()).map(|e| self.edge_length(e)).sum()
    }

    pub fn edge_bbox(&self, e: usize) -> BBox3 {
        let [a, b] = self.edge_vertices(e);
        BBox3::from_points([&self.points[a], &self.points[b]])
    }

    pub fn edge_bboxes(&self) -> Vec<BBox3> {
        (0..self.nedges()).map(|e| self.edge_bbox(e)).collect()
    }

    /// Number of edge ends on each vertex.
    pub fn valences(&self) -> Vec<usize> {
        let mut valence = vec![0; self.nverts()];
        for &v in &self.edges {
            valence[v] += 1;
        }
        valence
    }

    pub(crate) fn check_incidence(&self) -> Result<(), MeshError> {
        if self.edges.len() % 2 != 0 {
            return Err(MeshError::InvalidLayout {
                len: self.edges.len(),
                details: "odd number of edge ends".into(),
            });
        }
        let nverts = self.nverts();
        match self.edges.iter().position(|&v| v >= nverts) {
            Some(corner) => Err(MeshError::InvalidIncidence {
                corner,
                vertex: self.edges[corner],
                nverts,
            }),
            None => Ok(()),
        }
    }
}

impl AttributeOwner<category::Points> for PolyLine {
    fn registry(&self) -> &AttributeRegistry {
        self.points.attributes()
    }

    fn element_count(&self) -> usize {
        self.nverts()
    }
}

impl AttributeOwner<category::Edges> for PolyLine {
    fn registry(&self) -> &AttributeRegistry {
        &self.attr_edges
    }

    fn element_count(&self) -> usize {
        self.nedges()
    }
}

impl DebugInvariants for PolyLine {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "PolyLine");
    }

    fn validate_invariants(&self) -> Result<(), MeshError> {
        self.check_incidence()?;
        self.points.validate_invariants()?;
        self.attr_edges.check_lengths("edges", self.nedges())
    }
}
