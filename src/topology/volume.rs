//! Volume meshes of a single cell type.
//!
//! A [`Volume`] stores `nverts_per_cell` vertex indices per cell in one flat
//! array. Three registries follow its edits: per cell, per half-facet (local
//! facet `lf` of cell `c` is half-facet `c * nfacets_per_cell + lf`) and per
//! cell corner. Cell-to-cell adjacency is not cached here; build a
//! [`CellsAdjacency`](super::halfedge::CellsAdjacency) snapshot when needed.

use super::cell_type::CellType;
use crate::data::attribute::{AttributeOwner, AttributeRegistry, category, compaction_map};
use crate::data::point_set::PointSet;
use crate::debug_invariants::DebugInvariants;
use crate::geometry::{BBox3, Vec3, primitives};
use crate::mesh_error::MeshError;

/// Volume mesh made of one [`CellType`].
#[derive(Debug)]
pub struct Volume {
    cell_type: CellType,
    points: PointSet,
    cells: Vec<usize>,
    attr_cells: AttributeRegistry,
    attr_facets: AttributeRegistry,
    attr_corners: AttributeRegistry,
}

impl Volume {
    pub fn new(cell_type: CellType) -> Self {
        Self::with_points(cell_type, PointSet::new())
    }

    pub fn tetrahedra() -> Self {
        Self::new(CellType::Tetrahedron)
    }

    pub fn hexahedra() -> Self {
        Self::new(CellType::Hexahedron)
    }

    pub fn wedges() -> Self {
        Self::new(CellType::Wedge)
    }

    pub fn pyramids() -> Self {
        Self::new(CellType::Pyramid)
    }

    /// Empty volume over existing points.
    pub fn with_points(cell_type: CellType, points: PointSet) -> Self {
        Self {
            cell_type,
            points,
            cells: Vec::new(),
            attr_cells: AttributeRegistry::new(),
            attr_facets: AttributeRegistry::new(),
            attr_corners: AttributeRegistry::new(),
        }
    }

    /// Volume from raw incidence, checking its length and vertex range.
    pub fn from_parts(
        cell_type: CellType,
        points: PointSet,
        incidence: Vec<usize>,
    ) -> Result<Self, MeshError> {
        let m = Self {
            cells: incidence,
            ..Self::with_points(cell_type, points)
        };
        m.check_incidence()?;
        Ok(m)
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn nverts(&self) -> usize {
        self.points.len()
    }

    pub fn ncells(&self) -> usize {
        self.cells.len() / self.nverts_per_cell()
    }

    pub fn ncorners(&self) -> usize {
        self.cells.len()
    }

    /// Number of half-facets (local facets of every cell).
    pub fn nfacets(&self) -> usize {
        self.ncells() * self.nfacets_per_cell()
    }

    pub fn nverts_per_cell(&self) -> usize {
        self.cell_type.nverts()
    }

    pub fn nfacets_per_cell(&self) -> usize {
        self.cell_type.nfacets()
    }

    /// Vertices of local facet `lf` of every cell.
    pub fn facet_size(&self, lf: usize) -> usize {
        self.cell_type.facet_size(lf)
    }

    pub fn corner(&self, c: usize, lv: usize) -> usize {
        debug_assert!(lv < self.nverts_per_cell());
        c * self.nverts_per_cell() + lv
    }

    pub fn vert(&self, c: usize, lv: usize) -> usize {
        self.cells[self.corner(c, lv)]
    }

    pub fn set_vert(&mut self, c: usize, lv: usize, v: usize) {
        let corner = self.corner(c, lv);
        self.cells[corner] = v;
    }

    pub fn cell_vertices(&self, c: usize) -> &[usize] {
        let n = self.nverts_per_cell();
        &self.cells[c * n..(c + 1) * n]
    }

    /// Half-facet id of local facet `lf` of cell `c`.
    pub fn facet(&self, c: usize, lf: usize) -> usize {
        c * self.nfacets_per_cell() + lf
    }

    /// Cell corner at position `lfv` of local facet `lf` of cell `c`.
    pub fn facet_corner(&self, c: usize, lf: usize, lfv: usize) -> usize {
        self.corner(c, self.cell_type.facet_vert(lf, lfv))
    }

    /// Vertex at position `lfv` of local facet `lf` of cell `c`.
    pub fn facet_vert(&self, c: usize, lf: usize, lfv: usize) -> usize {
        self.cells[self.facet_corner(c, lf, lfv)]
    }

    pub fn incidence(&self) -> &[usize] {
        &self.cells
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

    pub fn coords_mut(&mut self) -> &mut [Vec3] {
        self.points.as_mut_slice()
    }

    pub fn create_points(&mut self, n: usize) -> usize {
        self.points.create_points(n)
    }

    pub fn push_point(&mut self, p: Vec3) -> usize {
        self.points.push(p)
    }

    pub fn cell_attributes(&self) -> &AttributeRegistry {
        &self.attr_cells
    }

    pub fn cell_facet_attributes(&self) -> &AttributeRegistry {
        &self.attr_facets
    }

    pub fn cell_corner_attributes(&self) -> &AttributeRegistry {
        &self.attr_corners
    }

    fn resize_registries(&mut self) {
        self.attr_cells.resize(self.ncells());
        self.attr_facets.resize(self.nfacets());
        self.attr_corners.resize(self.ncorners());
    }

    /// Append `n` cells, all on vertex 0; returns the first new cell index.
    pub fn create_cells(&mut self, n: usize) -> usize {
        let first = self.ncells();
        self.cells
            .resize(self.cells.len() + n * self.nverts_per_cell(), 0);
        self.resize_registries();
        first
    }

    /// Append one cell; `verts` must hold exactly `nverts_per_cell` indices.
    pub fn add_cell(&mut self, verts: &[usize]) -> usize {
        assert_eq!(
            verts.len(),
            self.nverts_per_cell(),
            "add_cell: a {} has {} vertices",
            self.cell_type,
            self.nverts_per_cell()
        );
        let c = self.ncells();
        self.cells.extend_from_slice(verts);
        self.resize_registries();
        c
    }

    /// Delete the cells flagged in `to_kill`, keeping survivors in order.
    ///
    /// Cell, half-facet and cell-corner attributes are compacted with the
    /// matching rank maps.
    pub fn delete_cells(&mut self, to_kill: &[bool]) {
        let nc = self.ncells();
        assert_eq!(
            to_kill.len(),
            nc,
            "delete_cells: mask has {} entries for {nc} cells",
            to_kill.len()
        );
        if !to_kill.contains(&true) {
            return;
        }

        let expand = |per_cell: usize| -> Vec<Option<usize>> {
            let fine: Vec<bool> = to_kill
                .iter()
                .flat_map(|&k| std::iter::repeat_n(k, per_cell))
                .collect();
            compaction_map(&fine)
        };
        let cell_map = compaction_map(to_kill);
        let facet_map = expand(self.nfacets_per_cell());
        let corner_map = expand(self.nverts_per_cell());

        let nv = self.nverts_per_cell();
        let mut kept = 0;
        for c in (0..nc).filter(|&c| !to_kill[c]) {
            self.cells.copy_within(c * nv..(c + 1) * nv, kept * nv);
            kept += 1;
        }
        self.cells.truncate(kept * nv);

        self.attr_cells.compress(&cell_map);
        self.attr_facets.compress(&facet_map);
        self.attr_corners.compress(&corner_map);

        crate::debug_invariants!(self.validate_invariants(), "Volume::delete_cells");
    }

    /// Delete the vertices flagged in `to_kill` and renumber the incidence.
    ///
    /// # Panics
    /// If a surviving cell still uses a deleted vertex.
    pub fn delete_vertices(&mut self, to_kill: &[bool]) {
        if let Err(e) = self.try_delete_vertices(to_kill) {
            panic!("delete_vertices: {e}");
        }
    }

    /// Fallible [`Volume::delete_vertices`]; leaves the volume untouched on
    /// error.
    pub fn try_delete_vertices(&mut self, to_kill: &[bool]) -> Result<(), MeshError> {
        assert_eq!(
            to_kill.len(),
            self.nverts(),
            "delete_vertices: mask has {} entries for {} vertices",
            to_kill.len(),
            self.nverts()
        );
        if let Some(corner) = self.cells.iter().position(|&v| to_kill[v]) {
            return Err(MeshError::VertexStillReferenced {
                vertex: self.cells[corner],
                element: corner / self.nverts_per_cell(),
            });
        }
        let old2new = compaction_map(to_kill);
        for v in &mut self.cells {
            match old2new[*v] {
                Some(n) => *v = n,
                None => unreachable!("vertex {v} checked as kept"),
            }
        }
        self.points.compress(&old2new);
        crate::debug_invariants!(self.validate_invariants(), "Volume::delete_vertices");
        Ok(())
    }

    pub fn delete_isolated_vertices(&mut self) {
        let mut to_kill = vec![true; self.nverts()];
        for &v in &self.cells {
            to_kill[v] = false;
        }
        self.delete_vertices(&to_kill);
    }

    pub fn cell_points(&self, c: usize) -> Vec<Vec3> {
        self.cell_vertices(c)
            .iter()
            .map(|&v| self.points[v])
            .collect()
    }

    /// Mean of the cell's vertices.
    pub fn cell_bary(&self, c: usize) -> Vec3 {
        primitives::barycenter(&self.cell_points(c))
    }

    pub fn cell_bbox(&self, c: usize) -> BBox3 {
        BBox3::from_points(self.cell_vertices(c).iter().map(|&v| &self.points[v]))
    }

    pub fn cell_bboxes(&self) -> Vec<BBox3> {
        (0..self.ncells()).map(|c| self.cell_bbox(c)).collect()
    }

    fn facet_points(&self, c: usize, lf: usize) -> Vec<Vec3> {
        (0..self.facet_size(lf))
            .map(|lfv| self.points[self.facet_vert(c, lf, lfv)])
            .collect()
    }

    pub fn facet_bary(&self, c: usize, lf: usize) -> Vec3 {
        primitives::barycenter(&self.facet_points(c, lf))
    }

    /// Unit normal of local facet `lf`, pointing out of cell `c` for a
    /// positively oriented cell.
    pub fn facet_normal(&self, c: usize, lf: usize) -> Vec3 {
        primitives::polygon_normal(&self.facet_points(c, lf))
    }

    pub(crate) fn check_incidence(&self) -> Result<(), MeshError> {
        let nv = self.nverts_per_cell();
        if self.cells.len() % nv != 0 {
            return Err(MeshError::InvalidLayout {
                len: self.cells.len(),
                details: format!("not a multiple of {nv} vertices per {}", self.cell_type),
            });
        }
        let nverts = self.nverts();
        match self.cells.iter().position(|&v| v >= nverts) {
            Some(corner) => Err(MeshError::InvalidIncidence {
                corner,
                vertex: self.cells[corner],
                nverts,
            }),
            None => Ok(()),
        }
    }
}

impl AttributeOwner<category::Points> for Volume {
    fn registry(&self) -> &AttributeRegistry {
        self.points.attributes()
    }

    fn element_count(&self) -> usize {
        self.nverts()
    }
}

impl AttributeOwner<category::Cells> for Volume {
    fn registry(&self) -> &AttributeRegistry {
        &self.attr_cells
    }

    fn element_count(&self) -> usize {
        self.ncells()
    }
}

impl AttributeOwner<category::CellFacets> for Volume {
    fn registry(&self) -> &AttributeRegistry {
        &self.attr_facets
    }

    fn element_count(&self) -> usize {
        self.nfacets()
    }
}

impl AttributeOwner<category::CellCorners> for Volume {
    fn registry(&self) -> &AttributeRegistry {
        &self.attr_corners
    }

    fn element_count(&self) -> usize {
        self.ncorners()
    }
}

impl DebugInvariants for Volume {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Volume");
    }

    fn validate_invariants(&self) -> Result<(), MeshError> {
        self.check_incidence()?;
        self.points.validate_invariants()?;
        self.attr_cells.check_lengths("cells", self.ncells())?;
        self.attr_facets.check_lengths("cell facets", self.nfacets())?;
        self.attr_corners.check_lengths("cell corners", self.ncorners())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::attribute::{CellAttribute, CellCornerAttribute, CellFacetAttribute};

    fn two_tets() -> Volume {
        let mut m = Volume::tetrahedra();
        for p in [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
        ] {
            m.push_point(p);
        }
        m.add_cell(&[0, 1, 2, 3]);
        m.add_cell(&[1, 2, 3, 4]);
        m
    }

    #[test]
    fn counts() {
        let m = two_tets();
        assert_eq!(m.ncells(), 2);
        assert_eq!(m.nfacets(), 8);
        assert_eq!(m.ncorners(), 8);
        assert_eq!(m.facet(1, 2), 6);
        // Local facet 0 of a tet is [1, 2, 3].
        assert_eq!(m.facet_vert(1, 0, 0), 2);
        m.validate_invariants().unwrap();
    }

    #[test]
    fn create_cells_resizes_all_registries() {
        let mut m = two_tets();
        let ca = CellAttribute::<i32>::new(&m);
        let fa = CellFacetAttribute::<bool>::new(&m);
        let cca = CellCornerAttribute::<f64>::new(&m);
        assert_eq!(m.create_cells(2), 2);
        assert_eq!((ca.len(), fa.len(), cca.len()), (4, 16, 16));
    }

    #[test]
    fn delete_cells_uses_per_category_maps() {
        let mut m = two_tets();
        let ca = CellAttribute::<i32>::new(&m);
        let fa = CellFacetAttribute::<i32>::new(&m);
        let cca = CellCornerAttribute::<i32>::new(&m);
        ca.set(1, 5);
        for i in 0..8 {
            fa.set(i, i as i32);
            cca.set(i, 100 + i as i32);
        }
        m.delete_cells(&[true, false]);
        assert_eq!(m.incidence(), &[1, 2, 3, 4]);
        assert_eq!(ca.to_vec(), vec![5]);
        assert_eq!(fa.to_vec(), vec![4, 5, 6, 7]);
        assert_eq!(cca.to_vec(), vec![104, 105, 106, 107]);
    }

    #[test]
    fn isolated_vertices_after_cell_deletion() {
        let mut m = two_tets();
        m.delete_cells(&[false, true]);
        m.delete_isolated_vertices();
        assert_eq!(m.nverts(), 4);
        assert_eq!(m.incidence(), &[0, 1, 2, 3]);
    }

    #[test]
    fn referenced_vertex_is_reported() {
        let mut m = two_tets();
        let err = m
            .try_delete_vertices(&[false, false, false, false, true])
            .unwrap_err();
        assert!(matches!(
            err,
            MeshError::VertexStillReferenced { vertex: 4, element: 1 }
        ));
        assert_eq!(m.nverts(), 5);
    }

    #[test]
    fn from_parts_rejects_ragged_incidence() {
        let pts = PointSet::from_coords(vec![Vec3::zeros(); 4]);
        let err = Volume::from_parts(CellType::Tetrahedron, pts, vec![0, 1, 2]).unwrap_err();
        assert!(matches!(err, MeshError::InvalidLayout { len: 3, .. }));
    }

    #[test]
    fn cell_geometry() {
        let m = two_tets();
        assert_eq!(m.cell_bary(0), Vec3::repeat(0.25));
        let b = m.cell_bbox(1);
        assert_eq!(b.min, Vec3::zeros());
        assert_eq!(b.max, Vec3::repeat(1.0));
        assert_eq!(m.cell_bboxes().len(), 2);
    }
}
