//! Surface meshes: points plus facets stored as a flat corner array.
//!
//! A [`Surface`] owns its [`PointSet`], one vertex index per corner, and
//! the facet layout cutting corners into facets. Facet and corner
//! attributes are kept in sync through two registries; point attributes
//! through the point set.
//!
//! Surfaces are either disconnected (plain incidence, freely editable) or
//! connected (a [`SurfaceConnectivity`] is cached). Every operation that
//! changes the vertex count or the incidence panics while connected; see
//! [`Surface::compact`] for the one edit allowed in that state.

use std::ops::Range;

use super::connectivity::SurfaceConnectivity;
use super::layout::{FacetLayout, Fixed, Variable};
use crate::data::attribute::{AttributeOwner, AttributeRegistry, category, compaction_map};
use crate::data::point_set::PointSet;
use crate::debug_invariants::DebugInvariants;
use crate::geometry::{BBox3, Vec3, primitives};
use crate::mesh_error::MeshError;

/// Surface mesh over facet layout `L`.
#[derive(Debug)]
pub struct Surface<L: FacetLayout> {
    pub(crate) points: PointSet,
    pub(crate) facets: Vec<usize>,
    pub(crate) layout: L,
    attr_facets: AttributeRegistry,
    attr_corners: AttributeRegistry,
    pub(crate) conn: Option<SurfaceConnectivity>,
}

/// Surface made of triangles.
pub type Triangles = Surface<Fixed<3>>;
/// Surface made of quads.
pub type Quads = Surface<Fixed<4>>;
/// Surface made of polygons of any size.
pub type Polygons = Surface<Variable>;

impl<L: FacetLayout> Default for Surface<L> {
    fn default() -> Self {
        Self::with_points(PointSet::new())
    }
}

impl<L: FacetLayout> Surface<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty surface over existing points.
    pub fn with_points(points: PointSet) -> Self {
        Self {
            points,
            facets: Vec::new(),
            layout: L::default(),
            attr_facets: AttributeRegistry::new(),
            attr_corners: AttributeRegistry::new(),
            conn: None,
        }
    }

    pub(crate) fn assert_disconnected(&self, op: &str) {
        assert!(
            self.conn.is_none(),
            "{op}: surface is connected; disconnect() before editing"
        );
    }

    pub fn nverts(&self) -> usize {
        self.points.len()
    }

    pub fn nfacets(&self) -> usize {
        self.layout.nfacets(self.facets.len())
    }

    pub fn ncorners(&self) -> usize {
        self.facets.len()
    }

    pub fn facet_size(&self, f: usize) -> usize {
        self.layout.facet_size(f)
    }

    /// Corners of facet `f`.
    pub fn corners(&self, f: usize) -> Range<usize> {
        self.layout.corners(f)
    }

    /// Corner of local vertex `lv` in facet `f`.
    pub fn corner(&self, f: usize, lv: usize) -> usize {
        self.layout.corner(f, lv)
    }

    /// Vertex at local position `lv` of facet `f`.
    pub fn vert(&self, f: usize, lv: usize) -> usize {
        self.facets[self.layout.corner(f, lv)]
    }

    pub fn set_vert(&mut self, f: usize, lv: usize, v: usize) {
        self.assert_disconnected("set_vert");
        let c = self.layout.corner(f, lv);
        self.facets[c] = v;
    }

    /// Vertices of facet `f`, in winding order.
    pub fn facet_vertices(&self, f: usize) -> &[usize] {
        &self.facets[self.layout.corners(f)]
    }

    /// Vertex of every corner.
    pub fn incidence(&self) -> &[usize] {
        &self.facets
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    pub fn points(&self) -> &PointSet {
        &self.points
    }

    /// Mutable point set, e.g. to resize or compact it directly.
    pub fn points_mut(&mut self) -> &mut PointSet {
        self.assert_disconnected("points_mut");
        &mut self.points
    }

    pub fn point(&self, v: usize) -> &Vec3 {
        &self.points[v]
    }

    /// Coordinates only; moving points keeps connectivity valid.
    pub fn coords_mut(&mut self) -> &mut [Vec3] {
        self.points.as_mut_slice()
    }

    /// Append `n` points at the origin; returns the first new index.
    pub fn create_points(&mut self, n: usize) -> usize {
        self.assert_disconnected("create_points");
        self.points.create_points(n)
    }

    pub fn push_point(&mut self, p: Vec3) -> usize {
        self.assert_disconnected("push_point");
        self.points.push(p)
    }

    pub fn facet_attributes(&self) -> &AttributeRegistry {
        &self.attr_facets
    }

    pub fn corner_attributes(&self) -> &AttributeRegistry {
        &self.attr_corners
    }

    fn resize_registries(&mut self) {
        self.attr_facets.resize(self.nfacets());
        self.attr_corners.resize(self.ncorners());
    }

    /// Append one facet through `verts`; returns its index.
    ///
    /// # Panics
    /// If connected, or if the layout has a fixed size other than `verts.len()`.
    pub fn add_facet(&mut self, verts: &[usize]) -> usize {
        self.assert_disconnected("add_facet");
        assert!(
            self.layout.accepts(verts.len()),
            "add_facet: layout {:?} cannot hold a facet of {} vertices",
            self.layout,
            verts.len()
        );
        let f = self.nfacets();
        self.layout.push_facet(verts.len());
        self.facets.extend_from_slice(verts);
        self.resize_registries();
        f
    }

    /// Delete the facets flagged in `to_kill`.
    ///
    /// Survivors keep their relative order; facet and corner attributes are
    /// compacted accordingly. Points are untouched.
    pub fn delete_facets(&mut self, to_kill: &[bool]) {
        self.assert_disconnected("delete_facets");
        let nf = self.nfacets();
        assert_eq!(
            to_kill.len(),
            nf,
            "delete_facets: mask has {} entries for {nf} facets",
            to_kill.len()
        );
        if !to_kill.contains(&true) {
            return;
        }

        let facet_map = compaction_map(to_kill);
        let mut corner_map = vec![None; self.ncorners()];
        let mut kept = 0;
        for f in (0..nf).filter(|&f| !to_kill[f]) {
            for c in self.layout.corners(f) {
                corner_map[c] = Some(kept);
                self.facets[kept] = self.facets[c];
                kept += 1;
            }
        }
        self.facets.truncate(kept);
        self.layout.retain(to_kill);
        self.attr_facets.compress(&facet_map);
        self.attr_corners.compress(&corner_map);

        crate::debug_invariants!(self.validate_invariants(), "Surface::delete_facets");
    }

    /// Delete the vertices flagged in `to_kill` and renumber the incidence.
    ///
    /// # Panics
    /// If a surviving facet still uses a deleted vertex. Delete such facets
    /// first, or use [`Surface::try_delete_vertices`].
    pub fn delete_vertices(&mut self, to_kill: &[bool]) {
        if let Err(e) = self.try_delete_vertices(to_kill) {
            panic!("delete_vertices: {e}");
        }
    }

    /// Like [`Surface::delete_vertices`], but reports a still-referenced
    /// vertex as [`MeshError::VertexStillReferenced`] and leaves the surface
    /// untouched.
    pub fn try_delete_vertices(&mut self, to_kill: &[bool]) -> Result<(), MeshError> {
        self.assert_disconnected("delete_vertices");
        assert_eq!(
            to_kill.len(),
            self.nverts(),
            "delete_vertices: mask has {} entries for {} vertices",
            to_kill.len(),
            self.nverts()
        );
        for f in 0..self.nfacets() {
            if let Some(&vertex) = self.facet_vertices(f).iter().find(|&&v| to_kill[v]) {
                return Err(MeshError::VertexStillReferenced { vertex, element: f });
            }
        }

        let old2new = compaction_map(to_kill);
        for v in &mut self.facets {
            match old2new[*v] {
                Some(n) => *v = n,
                None => unreachable!("vertex {v} checked as kept"),
            }
        }
        self.points.compress(&old2new);

        crate::debug_invariants!(self.validate_invariants(), "Surface::delete_vertices");
        Ok(())
    }

    /// Delete every vertex no facet refers to.
    pub fn delete_isolated_vertices(&mut self) {
        let mut to_kill = vec![true; self.nverts()];
        for &v in &self.facets {
            to_kill[v] = false;
        }
        self.delete_vertices(&to_kill);
    }

    /// Positions of the vertices of facet `f`.
    pub fn facet_points(&self, f: usize) -> Vec<Vec3> {
        self.facet_vertices(f)
            .iter()
            .map(|&v| self.points[v])
            .collect()
    }

    pub fn facet_bary(&self, f: usize) -> Vec3 {
        primitives::barycenter(&self.facet_points(f))
    }

    /// Unit normal following the facet winding.
    pub fn facet_normal(&self, f: usize) -> Vec3 {
        primitives::polygon_normal(&self.facet_points(f))
    }

    pub fn facet_area(&self, f: usize) -> f64 {
        primitives::polygon_area(&self.facet_points(f))
    }

    pub fn facet_bbox(&self, f: usize) -> BBox3 {
        BBox3::from_points(self.facet_vertices(f).iter().map(|&v| &self.points[v]))
    }

    /// One box per facet, ready for [`HBoxes::new`](crate::geometry::HBoxes::new).
    pub fn facet_bboxes(&self) -> Vec<BBox3> {
        (0..self.nfacets()).map(|f| self.facet_bbox(f)).collect()
    }
}

impl<const N: usize> Surface<Fixed<N>> {
    /// Append `n` facets of `N` corners, all on vertex 0.
    ///
    /// Returns the index of the first new facet.
    pub fn create_facets(&mut self, n: usize) -> usize {
        self.assert_disconnected("create_facets");
        let first = self.nfacets();
        self.facets.resize(self.facets.len() + n * N, 0);
        self.resize_registries();
        first
    }
}

impl Surface<Variable> {
    /// Append `n` facets of `size` corners each, all on vertex 0.
    ///
    /// Returns the index of the first new facet.
    pub fn create_facets(&mut self, n: usize, size: usize) -> usize {
        self.assert_disconnected("create_facets");
        let first = self.nfacets();
        for _ in 0..n {
            self.layout.push_facet(size);
        }
        self.facets.resize(self.facets.len() + n * size, 0);
        self.resize_registries();
        first
    }
}

impl<L: FacetLayout> Surface<L> {
    /// Surface from raw parts: facet `f` spans corners
    /// `offsets[f]..offsets[f + 1]` of `incidence`.
    ///
    /// Fails if the offsets do not fit the layout `L` or if a corner refers
    /// to a missing vertex.
    pub fn from_parts(
        points: PointSet,
        offsets: &[usize],
        incidence: Vec<usize>,
    ) -> Result<Self, MeshError> {
        let layout = L::from_facet_offsets(offsets, incidence.len())?;
        let m = Self {
            layout,
            facets: incidence,
            ..Self::with_points(points)
        };
        m.check_incidence()?;
        Ok(m)
    }

    pub(crate) fn check_incidence(&self) -> Result<(), MeshError> {
        let nverts = self.nverts();
        match self.facets.iter().position(|&v| v >= nverts) {
            Some(corner) => Err(MeshError::InvalidIncidence {
                corner,
                vertex: self.facets[corner],
                nverts,
            }),
            None => Ok(()),
        }
    }
}

impl<L: FacetLayout> AttributeOwner<category::Points> for Surface<L> {
    fn registry(&self) -> &AttributeRegistry {
        self.points.attributes()
    }

    fn element_count(&self) -> usize {
        self.nverts()
    }
}

impl<L: FacetLayout> AttributeOwner<category::Facets> for Surface<L> {
    fn registry(&self) -> &AttributeRegistry {
        &self.attr_facets
    }

    fn element_count(&self) -> usize {
        self.nfacets()
    }
}

impl<L: FacetLayout> AttributeOwner<category::Corners> for Surface<L> {
    fn registry(&self) -> &AttributeRegistry {
        &self.attr_corners
    }

    fn element_count(&self) -> usize {
        self.ncorners()
    }
}

impl<L: FacetLayout> DebugInvariants for Surface<L> {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Surface");
    }

    fn validate_invariants(&self) -> Result<(), MeshError> {
        self.layout.validate(self.ncorners())?;
        self.check_incidence()?;
        self.points.validate_invariants()?;
        self.attr_facets.check_lengths("facets", self.nfacets())?;
        self.attr_corners.check_lengths("corners", self.ncorners())?;
        if let Some(conn) = &self.conn {
            conn.check_sizes(self.nverts(), self.nfacets(), self.ncorners())?;
        }
        Ok(())
    }
}
