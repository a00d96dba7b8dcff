//! Reference-cell tables for volumetric cells.
//!
//! Local vertex numbering:
//!
//! - **Tetrahedron**: `[v0, v1, v2, v3]`, positively oriented.
//! - **Hexahedron**: vertex `i` sits at `(i & 1, (i >> 1) & 1, (i >> 2) & 1)`
//!   on the unit cube, so the bottom face is `[0, 1, 3, 2]` in cyclic order.
//! - **Wedge**: bottom triangle `[0, 1, 2]`, top triangle `[3, 4, 5]`, with
//!   `i + 3` above `i`.
//! - **Pyramid**: base quad `[0, 1, 2, 3]` counter-clockwise from above,
//!   apex `4`.
//!
//! Every local facet lists its vertices counter-clockwise seen from outside
//! the cell. Half-edges are numbered cell-facet by cell-facet, so the
//! half-edges of local facet `lf` start at [`CellType::halfedge_offset`].

use serde::{Deserialize, Serialize};

/// Volumetric cell kinds.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum CellType {
    /// 4 vertices, 4 triangles.
    Tetrahedron,
    /// 8 vertices, 6 quads.
    Hexahedron,
    /// 6 vertices, 2 triangles and 3 quads (also called prism).
    Wedge,
    /// 5 vertices, 1 quad and 4 triangles.
    Pyramid,
}

const TET_FACETS: &[&[usize]] = &[&[1, 2, 3], &[0, 3, 2], &[0, 1, 3], &[0, 2, 1]];

const HEX_FACETS: &[&[usize]] = &[
    &[0, 4, 6, 2],
    &[1, 3, 7, 5],
    &[0, 1, 5, 4],
    &[2, 6, 7, 3],
    &[0, 2, 3, 1],
    &[4, 5, 7, 6],
];

const WEDGE_FACETS: &[&[usize]] = &[
    &[0, 2, 1],
    &[3, 4, 5],
    &[0, 1, 4, 3],
    &[0, 3, 5, 2],
    &[1, 2, 5, 4],
];

const PYRAMID_FACETS: &[&[usize]] = &[
    &[0, 3, 2, 1],
    &[0, 1, 4],
    &[1, 2, 4],
    &[2, 3, 4],
    &[3, 0, 4],
];

const TET_HE_OFFSET: &[usize] = &[0, 3, 6, 9, 12];
const HEX_HE_OFFSET: &[usize] = &[0, 4, 8, 12, 16, 20, 24];
const WEDGE_HE_OFFSET: &[usize] = &[0, 3, 6, 10, 14, 18];
const PYRAMID_HE_OFFSET: &[usize] = &[0, 4, 7, 10, 13, 16];

impl CellType {
    /// Every supported cell type, in exchange-code order.
    pub const ALL: [CellType; 4] = [
        CellType::Tetrahedron,
        CellType::Hexahedron,
        CellType::Wedge,
        CellType::Pyramid,
    ];

    /// Code used by the binary exchange format.
    pub fn code(self) -> i32 {
        match self {
            CellType::Tetrahedron => 0,
            CellType::Hexahedron => 1,
            CellType::Wedge => 2,
            CellType::Pyramid => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.get(usize::try_from(code).ok()?).copied()
    }

    pub fn nverts(self) -> usize {
        match self {
            CellType::Tetrahedron => 4,
            CellType::Hexahedron => 8,
            CellType::Wedge => 6,
            CellType::Pyramid => 5,
        }
    }

    fn facets(self) -> &'static [&'static [usize]] {
        match self {
            CellType::Tetrahedron => TET_FACETS,
            CellType::Hexahedron => HEX_FACETS,
            CellType::Wedge => WEDGE_FACETS,
            CellType::Pyramid => PYRAMID_FACETS,
        }
    }

    fn he_offsets(self) -> &'static [usize] {
        match self {
            CellType::Tetrahedron => TET_HE_OFFSET,
            CellType::Hexahedron => HEX_HE_OFFSET,
            CellType::Wedge => WEDGE_HE_OFFSET,
            CellType::Pyramid => PYRAMID_HE_OFFSET,
        }
    }

    /// Local facets per cell.
    pub fn nfacets(self) -> usize {
        self.facets().len()
    }

    /// Vertices of local facet `lf`.
    pub fn facet_size(self, lf: usize) -> usize {
        self.facets()[lf].len()
    }

    /// Local cell vertex at position `lfv` of local facet `lf`.
    pub fn facet_vert(self, lf: usize, lfv: usize) -> usize {
        self.facets()[lf][lfv]
    }

    /// Local cell vertices of local facet `lf`, outward winding.
    pub fn facet_verts(self, lf: usize) -> &'static [usize] {
        self.facets()[lf]
    }

    /// Half-edges per cell: the sum of all facet sizes.
    pub fn nhalfedges(self) -> usize {
        let off = self.he_offsets();
        off[off.len() - 1]
    }

    /// First cell half-edge of local facet `lf`.
    pub fn halfedge_offset(self, lf: usize) -> usize {
        self.he_offsets()[lf]
    }

    /// Split a cell half-edge index into `(local facet, facet half-edge)`.
    pub fn decompose(self, ch: usize) -> (usize, usize) {
        assert!(ch < self.nhalfedges(), "cell half-edge {ch} out of range for {self:?}");
        let off = self.he_offsets();
        let lf = off.partition_point(|&o| o <= ch) - 1;
        (lf, ch - off[lf])
    }
}

impl std::fmt::Display for CellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CellType::Tetrahedron => "tetrahedron",
            CellType::Hexahedron => "hexahedron",
            CellType::Wedge => "wedge",
            CellType::Pyramid => "pyramid",
        };
        f.write_str(name)
    }
}
