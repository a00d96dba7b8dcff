//! Geogram binary `.geogram` reader and writer.
//!
//! # Format
//! A gzip stream of chunks. Each chunk is a 4-byte ASCII tag, a `u64`
//! little-endian payload length, then the payload. Strings are a `u32`
//! length followed by the bytes.
//! - `HEAD`: magic `GEOGRAM`, version `1.0`. Always first.
//! - `ATTS`: element set name and its size.
//! - `ATTR`: set name, attribute name, element type name, element byte size,
//!   dimension, then `size * element_size * dimension` bytes of values.
//!
//! Mesh structure is stored as attributes of reserved names (`point`,
//! `GEO::Mesh::facet_corners::corner_vertex`, ...). `facet_ptr` and
//! `cell_ptr` hold the first corner of each element. Polyline segments are
//! one two-component `edge_vertex` index per edge.
//!
//! # Limitations
//! - Integer attributes with more than one component are skipped, except
//!   `edge_vertex`.
//! - Connector cells (code 4) are recognized but never kept.

use std::io::{self, Read, Take, Write};
use std::path::Path;
use std::rc::Rc;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use hashbrown::HashMap;

use crate::data::attribute::{
    AttributeStore, GenericAttribute, NamedAttribute, SharedContainer, category, shared,
    take_named,
};
use crate::data::attribute_kind::AttributeKind;
use crate::data::point_set::PointSet;
use crate::geometry::{Vec2, Vec3};
use crate::io::{
    MeshData, MeshReader, MeshWriter, PolyLineAttributes, SurfaceAttributes, VolumeAttributes,
    attach_all, check_list, read_file, write_file,
};
use crate::mesh_error::MeshError;
use crate::topology::cell_type::CellType;
use crate::topology::connectivity::{Adjacency, SurfaceConnectivity};
use crate::topology::layout::FacetLayout;
use crate::topology::polyline::PolyLine;
use crate::topology::surface::Surface;
use crate::topology::volume::Volume;

const MAGIC: &str = "GEOGRAM";
const VERSION: &str = "1.0";

const POINT: &str = "point";
const EDGE_VERTEX: &str = "GEO::Mesh::edges::edge_vertex";
const FACET_PTR: &str = "GEO::Mesh::facets::facet_ptr";
const FACET_CORNER_VERTEX: &str = "GEO::Mesh::facet_corners::corner_vertex";
const CORNER_ADJACENT_FACET: &str = "GEO::Mesh::facet_corners::corner_adjacent_facet";
const ADJACENT_CELL: &str = "GEO::Mesh::cell_facets::adjacent_cell";
const CELL_TYPE: &str = "GEO::Mesh::cells::cell_type";
const CELL_PTR: &str = "GEO::Mesh::cells::cell_ptr";
const CELL_CORNER_VERTEX: &str = "GEO::Mesh::cell_corners::corner_vertex";

/// Element sets of a geogram file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementSet {
    Vertices,
    Edges,
    Facets,
    FacetCorners,
    Cells,
    CellFacets,
    CellCorners,
}

impl ElementSet {
    pub const ALL: [ElementSet; 7] = [
        ElementSet::Vertices,
        ElementSet::Edges,
        ElementSet::Facets,
        ElementSet::FacetCorners,
        ElementSet::Cells,
        ElementSet::CellFacets,
        ElementSet::CellCorners,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ElementSet::Vertices => "GEO::Mesh::vertices",
            ElementSet::Edges => "GEO::Mesh::edges",
            ElementSet::Facets => "GEO::Mesh::facets",
            ElementSet::FacetCorners => "GEO::Mesh::facet_corners",
            ElementSet::Cells => "GEO::Mesh::cells",
            ElementSet::CellFacets => "GEO::Mesh::cell_facets",
            ElementSet::CellCorners => "GEO::Mesh::cell_corners",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Everything a geogram file declares, grouped by element set.
#[derive(Default)]
pub struct GeogramContents {
    sizes: [Option<usize>; 7],
    attributes: [Vec<NamedAttribute>; 7],
}

impl GeogramContents {
    /// Declared size of `set`, `None` if the file has no `ATTS` for it.
    pub fn size(&self, set: ElementSet) -> Option<usize> {
        self.sizes[set.index()]
    }

    pub fn attributes(&self, set: ElementSet) -> &[NamedAttribute] {
        &self.attributes[set.index()]
    }

    /// Move the attribute list of `set` out.
    pub fn take(&mut self, set: ElementSet) -> Vec<NamedAttribute> {
        std::mem::take(&mut self.attributes[set.index()])
    }
}

impl std::fmt::Debug for GeogramContents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut d = f.debug_struct("GeogramContents");
        for set in ElementSet::ALL {
            let names: Vec<&str> = self
                .attributes(set)
                .iter()
                .map(|(n, _)| n.as_str())
                .collect();
            d.field(set.as_str(), &(self.size(set), names));
        }
        d.finish()
    }
}

// ---------------------------------------------------------------------------
// Chunk layer
// ---------------------------------------------------------------------------

fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(u32::from_le_bytes(b))
}

fn read_u64<R: Read>(r: &mut R) -> io::Result<u64> {
    let mut b = [0u8; 8];
    r.read_exact(&mut b)?;
    Ok(u64::from_le_bytes(b))
}

/// Exactly `len` bytes, never allocating more than the stream holds.
fn read_bytes<R: Read>(r: &mut R, len: u64, what: &str) -> Result<Vec<u8>, MeshError> {
    let mut buf = Vec::new();
    r.by_ref().take(len).read_to_end(&mut buf)?;
    if buf.len() as u64 != len {
        return Err(MeshError::MeshIoParse(format!(
            "truncated {what}: expected {len} bytes, got {}",
            buf.len()
        )));
    }
    Ok(buf)
}

fn read_string<R: Read>(r: &mut R) -> Result<String, MeshError> {
    let len = read_u32(r)?;
    let bytes = read_bytes(r, u64::from(len), "string")?;
    String::from_utf8(bytes).map_err(|e| MeshError::MeshIoParse(format!("invalid string: {e}")))
}

struct ChunkHeader {
    tag: [u8; 4],
    len: u64,
}

impl ChunkHeader {
    fn tag(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }
}

struct ChunkReader<R> {
    inner: R,
}

impl<R: Read> ChunkReader<R> {
    fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Next chunk header, `None` on a clean end of stream.
    fn next_header(&mut self) -> Result<Option<ChunkHeader>, MeshError> {
        let mut tag = [0u8; 4];
        let mut filled = 0;
        while filled < tag.len() {
            match self.inner.read(&mut tag[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => {
                    return Err(MeshError::MeshIoParse("truncated chunk tag".into()));
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        let len = read_u64(&mut self.inner)?;
        Ok(Some(ChunkHeader { tag, len }))
    }

    fn body(&mut self, header: &ChunkHeader) -> Take<&mut R> {
        (&mut self.inner).take(header.len)
    }
}

/// Bytes consumed so far from a chunk body.
fn consumed<R>(header: &ChunkHeader, body: &Take<R>) -> u64 {
    header.len - body.limit()
}

fn check_chunk_size<R>(header: &ChunkHeader, body: &Take<R>) -> Result<(), MeshError> {
    let found = consumed(header, body);
    if found != header.len {
        return Err(MeshError::ChunkSizeMismatch {
            tag: header.tag(),
            expected: header.len,
            found,
        });
    }
    Ok(())
}

/// Drop the unread rest of a chunk body.
fn skip_rest<R: Read>(header: &ChunkHeader, body: &mut Take<R>) -> Result<(), MeshError> {
    let remaining = body.limit();
    let skipped = io::copy(body, &mut io::sink())?;
    if skipped != remaining {
        return Err(MeshError::MeshIoParse(format!(
            "truncated `{}` chunk: {} bytes missing",
            header.tag(),
            remaining - skipped
        )));
    }
    Ok(())
}

struct ChunkWriter<W: Write> {
    inner: W,
}

impl<W: Write> ChunkWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner }
    }

    fn into_inner(self) -> W {
        self.inner
    }

    fn u32(&mut self, v: u32) -> io::Result<()> {
        self.inner.write_all(&v.to_le_bytes())
    }

    fn string(&mut self, s: &str) -> Result<(), MeshError> {
        self.u32(len_u32(s.len())?)?;
        self.inner.write_all(s.as_bytes())?;
        Ok(())
    }

    fn header(&mut self, tag: &[u8; 4], len: usize) -> io::Result<()> {
        self.inner.write_all(tag)?;
        self.inner.write_all(&(len as u64).to_le_bytes())
    }

    fn head(&mut self) -> Result<(), MeshError> {
        self.header(b"HEAD", 4 + MAGIC.len() + 4 + VERSION.len())?;
        self.string(MAGIC)?;
        self.string(VERSION)
    }

    fn set_size(&mut self, set: ElementSet, n: usize) -> Result<(), MeshError> {
        let name = set.as_str();
        self.header(b"ATTS", 4 + name.len() + 4)?;
        self.string(name)?;
        self.u32(len_u32(n)?)?;
        Ok(())
    }

    fn attribute(&mut self, set: ElementSet, name: &str, values: &Encoded) -> Result<(), MeshError> {
        let set = set.as_str();
        let len = (4 + set.len())
            + (4 + name.len())
            + (4 + values.element_type.len())
            + 4
            + 4
            + values.bytes.len();
        self.header(b"ATTR", len)?;
        self.string(set)?;
        self.string(name)?;
        self.string(values.element_type)?;
        self.u32(values.element_size)?;
        self.u32(values.dimension)?;
        self.inner.write_all(&values.bytes)?;
        Ok(())
    }
}

fn len_u32(n: usize) -> Result<u32, MeshError> {
    u32::try_from(n).map_err(|_| MeshError::MeshIoParse(format!("{n} does not fit in 32 bits")))
}

// ---------------------------------------------------------------------------
// Value encodings
// ---------------------------------------------------------------------------

/// Raw values of one `ATTR` chunk.
struct Encoded {
    element_type: &'static str,
    element_size: u32,
    dimension: u32,
    bytes: Vec<u8>,
}

impl Encoded {
    fn indices(values: impl IntoIterator<Item = usize>) -> Result<Self, MeshError> {
        let mut bytes = Vec::new();
        for v in values {
            bytes.extend_from_slice(&len_u32(v)?.to_le_bytes());
        }
        Ok(Self {
            element_type: "index_t",
            element_size: 4,
            dimension: 1,
            bytes,
        })
    }

    fn doubles(values: &[f64], dimension: u32) -> Self {
        Self {
            element_type: "double",
            element_size: 8,
            dimension,
            bytes: values.iter().flat_map(|x| x.to_le_bytes()).collect(),
        }
    }

    fn scalars(kind: AttributeKind, bytes: Vec<u8>) -> Self {
        Self {
            element_type: kind.as_str(),
            element_size: kind.element_size() as u32,
            dimension: 1,
            bytes,
        }
    }

    fn points(points: &[Vec3]) -> Self {
        Self::doubles(bytemuck::cast_slice::<Vec3, f64>(points), 3)
    }

    /// Encode a storable container; `None` for element types the format
    /// cannot carry.
    fn container(c: &SharedContainer) -> Result<Option<Self>, MeshError> {
        let Some(kind) = c.borrow().kind() else {
            return Ok(None);
        };
        let c = Rc::clone(c);
        let encoded = match kind {
            AttributeKind::Int => {
                let a = GenericAttribute::<i32>::try_from_container(c)?;
                let bytes = a.borrow().iter().flat_map(|x| x.to_le_bytes()).collect();
                Self::scalars(kind, bytes)
            }
            AttributeKind::Double => {
                Self::doubles(&GenericAttribute::<f64>::try_from_container(c)?.borrow(), 1)
            }
            AttributeKind::Vec2 => {
                let a = GenericAttribute::<Vec2>::try_from_container(c)?;
                let values = a.borrow();
                Self::doubles(bytemuck::cast_slice::<Vec2, f64>(&values), 2)
            }
            AttributeKind::Vec3 => {
                let a = GenericAttribute::<Vec3>::try_from_container(c)?;
                let values = a.borrow();
                Self::doubles(bytemuck::cast_slice::<Vec3, f64>(&values), 3)
            }
            AttributeKind::Bool => {
                let a = GenericAttribute::<bool>::try_from_container(c)?;
                let bytes = a.borrow().iter().map(|&b| u8::from(b)).collect();
                Self::scalars(kind, bytes)
            }
        };
        Ok(Some(encoded))
    }
}

/// How the values of an `ATTR` chunk are decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Decoding {
    Int,
    Char,
    Double,
    Vec2,
    Vec3,
    Bool,
}

impl From<AttributeKind> for Decoding {
    fn from(kind: AttributeKind) -> Self {
        match kind {
            AttributeKind::Int => Decoding::Int,
            AttributeKind::Double => Decoding::Double,
            AttributeKind::Vec2 => Decoding::Vec2,
            AttributeKind::Vec3 => Decoding::Vec3,
            AttributeKind::Bool => Decoding::Bool,
        }
    }
}

impl Decoding {
    /// Decoding of `(element_type, element_size, dimension)`; `Ok(None)` for
    /// a type the kernel cannot store.
    fn from_header(
        element_type: &str,
        element_size: u32,
        dimension: u32,
    ) -> Result<Option<Self>, MeshError> {
        let (decoding, expected_size) = match element_type {
            "index_t" | "signed_index_t" => (Decoding::Int, 4),
            "char" => (Decoding::Char, 1),
            other => match AttributeKind::parse(other) {
                Some(kind) => (Decoding::from(kind), kind.element_size()),
                None => return Ok(None),
            },
        };
        if element_size as usize != expected_size {
            return Err(MeshError::MeshIoParse(format!(
                "element type `{element_type}` with element size {element_size}, expected {expected_size}"
            )));
        }
        let supported = match decoding {
            Decoding::Double => (1..=3).contains(&dimension),
            _ => dimension == 1,
        };
        Ok(supported.then_some(decoding))
    }

    fn decode(self, bytes: &[u8], dimension: u32) -> Result<SharedContainer, MeshError> {
        let container = match self {
            // Files are little-endian whatever the host; decode per word.
            Decoding::Int => shared(AttributeStore::from_vec(
                bytes
                    .chunks_exact(4)
                    .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                    .collect::<Vec<i32>>(),
            )),
            Decoding::Char => shared(AttributeStore::from_vec(
                bytes
                    .iter()
                    .map(|&b| i32::from(b as i8))
                    .collect::<Vec<i32>>(),
            )),
            Decoding::Bool => shared(AttributeStore::from_vec(
                bytes.iter().map(|&b| b != 0).collect::<Vec<bool>>(),
            )),
            Decoding::Double | Decoding::Vec2 | Decoding::Vec3 => {
                let raw = doubles(bytes);
                match (self, dimension) {
                    (Decoding::Double, 1) => shared(AttributeStore::from_vec(raw)),
                    (Decoding::Vec2, _) | (Decoding::Double, 2) => {
                        shared(AttributeStore::from_vec(cast_vec::<Vec2>(&raw)?))
                    }
                    _ => shared(AttributeStore::from_vec(cast_vec::<Vec3>(&raw)?)),
                }
            }
        };
        Ok(container)
    }
}

/// Little-endian words to host `f64`s. `bytemuck` only regroups the result,
/// since a raw cast of the bytes would be wrong on big-endian hosts.
fn doubles(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|b| {
            let mut le = [0u8; 8];
            le.copy_from_slice(b);
            f64::from_le_bytes(le)
        })
        .collect()
}

fn cast_vec<T: bytemuck::Pod>(raw: &[f64]) -> Result<Vec<T>, MeshError> {
    bytemuck::try_cast_slice::<f64, T>(raw)
        .map(<[T]>::to_vec)
        .map_err(|e| MeshError::MeshIoParse(format!("cannot group doubles: {e}")))
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Read every element set size and attribute of a gzip-compressed geogram
/// stream.
///
/// Adjacency attributes (`corner_adjacent_facet`, `adjacent_cell`) and
/// attributes of unsupported element types are skipped.
pub fn read_geogram_attributes<R: Read>(reader: R) -> Result<GeogramContents, MeshError> {
    let mut chunks = ChunkReader::new(GzDecoder::new(reader));

    let head = chunks
        .next_header()?
        .ok_or_else(|| MeshError::MissingHead("end of stream".into()))?;
    if &head.tag != b"HEAD" {
        return Err(MeshError::MissingHead(head.tag()));
    }
    {
        let mut body = chunks.body(&head);
        let magic = read_string(&mut body)?;
        if magic != MAGIC {
            return Err(MeshError::NotGeogram(magic));
        }
        let version = read_string(&mut body)?;
        log::debug!("geogram: file version {version}");
        check_chunk_size(&head, &body)?;
    }

    let mut contents = GeogramContents::default();
    let mut declared: HashMap<String, usize> = HashMap::new();
    while let Some(header) = chunks.next_header()? {
        let mut body = chunks.body(&header);
        match &header.tag {
            b"ATTS" => {
                let set = read_string(&mut body)?;
                let n = read_u32(&mut body)? as usize;
                check_chunk_size(&header, &body)?;
                if let Some(s) = ElementSet::parse(&set) {
                    contents.sizes[s.index()] = Some(n);
                }
                declared.insert(set, n);
            }
            b"ATTR" => {
                if let Some((set, name, container)) = read_attr(&header, &mut body, &declared)? {
                    contents.attributes[set.index()].push((name, container));
                }
            }
            _ => {
                log::warn!("geogram: skipping unknown `{}` chunk", header.tag());
                skip_rest(&header, &mut body)?;
            }
        }
    }
    Ok(contents)
}

/// Parse one `ATTR` chunk. `Ok(None)` means the chunk was skipped.
fn read_attr<R: Read>(
    header: &ChunkHeader,
    body: &mut Take<R>,
    declared: &HashMap<String, usize>,
) -> Result<Option<(ElementSet, String, SharedContainer)>, MeshError> {
    let set_name = read_string(body)?;
    let name = read_string(body)?;
    let element_type = read_string(body)?;
    let element_size = read_u32(body)?;
    let dimension = read_u32(body)?;

    let n = *declared
        .get(&set_name)
        .ok_or_else(|| MeshError::UndeclaredElementSet {
            set: set_name.clone(),
            name: name.clone(),
        })?;
    let payload = (n as u64)
        .checked_mul(u64::from(element_size))
        .and_then(|x| x.checked_mul(u64::from(dimension)))
        .ok_or_else(|| MeshError::MeshIoParse(format!("attribute `{name}` is too large")))?;
    let expected = consumed(header, body) + payload;
    if expected != header.len {
        return Err(MeshError::ChunkSizeMismatch {
            tag: header.tag(),
            expected: header.len,
            found: expected,
        });
    }

    let Some(set) = ElementSet::parse(&set_name) else {
        log::warn!("geogram: skipping `{name}` on unknown element set `{set_name}`");
        skip_rest(header, body)?;
        return Ok(None);
    };
    if name == CORNER_ADJACENT_FACET || name == ADJACENT_CELL {
        skip_rest(header, body)?;
        return Ok(None);
    }
    // Edge ends come as index pairs and are kept flat.
    let decoding = if name == EDGE_VERTEX {
        Decoding::from_header(&element_type, element_size, 1)?
            .filter(|&d| d == Decoding::Int && (1..=2).contains(&dimension))
    } else {
        Decoding::from_header(&element_type, element_size, dimension)?
    };
    let Some(decoding) = decoding else {
        log::warn!(
            "geogram: skipping `{name}` on `{set_name}`: unsupported element type `{element_type}` (dimension {dimension})"
        );
        skip_rest(header, body)?;
        return Ok(None);
    };

    let bytes = read_bytes(body, payload, "attribute data")?;
    check_chunk_size(header, body)?;
    let container = decoding.decode(&bytes, dimension)?;
    Ok(Some((set, name, container)))
}

/// Take the `point` attribute out of `vertices`; 2D points get `z = 0`.
fn take_points(vertices: &mut Vec<NamedAttribute>, nverts: usize) -> Result<PointSet, MeshError> {
    let Some(container) = take_named(vertices, POINT) else {
        if nverts == 0 {
            return Ok(PointSet::new());
        }
        return Err(MeshError::MissingAttribute(POINT.into()));
    };
    let kind = container.borrow().kind();
    let coords = match kind {
        Some(AttributeKind::Vec3) => GenericAttribute::<Vec3>::try_from_container(container)?.to_vec(),
        Some(AttributeKind::Vec2) => GenericAttribute::<Vec2>::try_from_container(container)?
            .borrow()
            .iter()
            .map(|p| Vec3::new(p.x, p.y, 0.0))
            .collect(),
        _ => {
            return Err(MeshError::MeshIoParse(format!(
                "`{POINT}` must hold 2D or 3D coordinates, found {}",
                container.borrow().type_name()
            )));
        }
    };
    Ok(PointSet::from_coords(coords))
}

/// Integer attribute `name` taken out of `list`, `None` if absent.
fn take_ints(list: &mut Vec<NamedAttribute>, name: &str) -> Result<Option<Vec<i32>>, MeshError> {
    take_named(list, name)
        .map(|c| GenericAttribute::<i32>::try_from_container(c).map(|a| a.to_vec()))
        .transpose()
}

/// File indices are unsigned 32-bit values stored in `i32` attributes.
fn index(v: i32) -> usize {
    v as u32 as usize
}

/// Compress every attribute of `list` with `old2new`, checking sizes first.
fn compress_list(list: &[NamedAttribute], old2new: &[Option<usize>]) -> Result<(), MeshError> {
    check_list(list, old2new.len())?;
    for (_, c) in list {
        c.borrow_mut().compress(old2new);
    }
    Ok(())
}

/// Surface reader. Files without `facet_ptr` are read as triangles.
#[derive(Debug, Default, Clone)]
pub struct GeogramReader;

impl<L: FacetLayout> MeshReader<Surface<L>> for GeogramReader {
    type Attributes = SurfaceAttributes;

    fn read<R: Read>(
        &self,
        reader: R,
    ) -> Result<MeshData<Surface<L>, SurfaceAttributes>, MeshError> {
        let mut contents = read_geogram_attributes(reader)?;

        let mut points = contents.take(ElementSet::Vertices);
        let point_set = take_points(&mut points, contents.size(ElementSet::Vertices).unwrap_or(0))?;

        let mut corners = contents.take(ElementSet::FacetCorners);
        let incidence: Vec<usize> = take_ints(&mut corners, FACET_CORNER_VERTEX)?
            .unwrap_or_default()
            .into_iter()
            .map(index)
            .collect();

        let mut facets = contents.take(ElementSet::Facets);
        let nfacets = contents.size(ElementSet::Facets).unwrap_or(0);
        let offsets: Vec<usize> = match take_ints(&mut facets, FACET_PTR)? {
            Some(ptr) => ptr
                .into_iter()
                .map(index)
                .chain(std::iter::once(incidence.len()))
                .collect(),
            None => (0..=nfacets).map(|f| 3 * f).collect(),
        };

        let mesh = Surface::from_parts(point_set, &offsets, incidence)?;
        attach_all::<category::Points, _>(&mesh, &points)?;
        attach_all::<category::Facets, _>(&mesh, &facets)?;
        attach_all::<category::Corners, _>(&mesh, &corners)?;

        log::info!(
            "geogram: read surface with {} vertices, {} facets",
            mesh.nverts(),
            mesh.nfacets()
        );
        Ok(MeshData {
            mesh,
            attributes: SurfaceAttributes {
                points,
                facets,
                corners,
            },
        })
    }
}

/// Polyline reader.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeogramPolyLineReader;

impl MeshReader<PolyLine> for GeogramPolyLineReader {
    type Attributes = PolyLineAttributes;

    fn read<R: Read>(&self, reader: R) -> Result<MeshData<PolyLine, PolyLineAttributes>, MeshError> {
        let mut contents = read_geogram_attributes(reader)?;

        let mut points = contents.take(ElementSet::Vertices);
        let point_set = take_points(&mut points, contents.size(ElementSet::Vertices).unwrap_or(0))?;

        let mut edges = contents.take(ElementSet::Edges);
        let nedges = contents.size(ElementSet::Edges).unwrap_or(0);
        let incidence: Vec<usize> = take_ints(&mut edges, EDGE_VERTEX)?
            .unwrap_or_default()
            .into_iter()
            .map(index)
            .collect();
        if incidence.len() != 2 * nedges {
            return Err(MeshError::AttributeSizeMismatch {
                name: EDGE_VERTEX.into(),
                expected: 2 * nedges,
                found: incidence.len(),
            });
        }

        let mesh = PolyLine::from_parts(point_set, incidence)?;
        attach_all::<category::Points, _>(&mesh, &points)?;
        attach_all::<category::Edges, _>(&mesh, &edges)?;

        log::info!(
            "geogram: read polyline with {} vertices, {} edges",
            mesh.nverts(),
            mesh.nedges()
        );
        Ok(MeshData {
            mesh,
            attributes: PolyLineAttributes { points, edges },
        })
    }
}

/// `(vertices, facets)` per cell of a geogram cell type code.
fn cell_shape(code: i32) -> Result<(usize, usize), MeshError> {
    match CellType::from_code(code) {
        Some(ct) => Ok((ct.nverts(), ct.nfacets())),
        None if code == 4 => Ok((4, 3)),
        None => Err(MeshError::UnsupportedCellType(code)),
    }
}

/// Volume reader keeping only the cells of `cell_type`.
///
/// Cell, cell-facet and cell-corner attributes are compacted to the kept
/// cells. A file without `cell_type` is read as tetrahedra.
#[derive(Debug, Clone, Copy)]
pub struct GeogramVolumeReader {
    pub cell_type: CellType,
}

impl GeogramVolumeReader {
    pub fn new(cell_type: CellType) -> Self {
        Self { cell_type }
    }
}

impl MeshReader<Volume> for GeogramVolumeReader {
    type Attributes = VolumeAttributes;

    fn read<R: Read>(&self, reader: R) -> Result<MeshData<Volume, VolumeAttributes>, MeshError> {
        let mut contents = read_geogram_attributes(reader)?;

        let mut points = contents.take(ElementSet::Vertices);
        let point_set = take_points(&mut points, contents.size(ElementSet::Vertices).unwrap_or(0))?;

        let mut cell_corners = contents.take(ElementSet::CellCorners);
        let corner_vertex = take_ints(&mut cell_corners, CELL_CORNER_VERTEX)?.unwrap_or_default();

        let mut cells = contents.take(ElementSet::Cells);
        let cell_facets = contents.take(ElementSet::CellFacets);
        let types = match take_ints(&mut cells, CELL_TYPE)? {
            Some(types) => types,
            None => vec![CellType::Tetrahedron.code(); corner_vertex.len() / 4],
        };
        let mut ptr = match take_ints(&mut cells, CELL_PTR)? {
            Some(ptr) => ptr.into_iter().map(index).collect(),
            None => {
                let mut ptr = Vec::with_capacity(types.len());
                let mut next = 0;
                for &code in &types {
                    ptr.push(next);
                    next += cell_shape(code)?.0;
                }
                ptr
            }
        };
        if ptr.len() != types.len() {
            return Err(MeshError::AttributeSizeMismatch {
                name: CELL_PTR.into(),
                expected: types.len(),
                found: ptr.len(),
            });
        }
        ptr.push(corner_vertex.len());

        let keep = self.cell_type.code();
        let nfacets_per_cell = self.cell_type.nfacets();
        let mut cell_map = vec![None; types.len()];
        let mut facet_map = Vec::new();
        let mut corner_map = vec![None; corner_vertex.len()];
        let mut incidence = Vec::new();
        let mut kept = 0;
        for (c, &code) in types.iter().enumerate() {
            let (nverts, nfacets) = cell_shape(code)?;
            let range = ptr[c]..ptr[c + 1];
            if range.start > range.end || range.end > corner_vertex.len() || range.len() != nverts {
                return Err(MeshError::MeshIoParse(format!(
                    "cell {c} spans corners {range:?}, expected {nverts} corners"
                )));
            }
            if code != keep {
                facet_map.extend(std::iter::repeat_n(None, nfacets));
                continue;
            }
            cell_map[c] = Some(kept);
            facet_map.extend((0..nfacets).map(|lf| Some(kept * nfacets_per_cell + lf)));
            for corner in range {
                corner_map[corner] = Some(incidence.len());
                incidence.push(index(corner_vertex[corner]));
            }
            kept += 1;
        }
        if kept == 0 && !types.is_empty() {
            log::warn!(
                "geogram: none of the {} cells is a {}; returning an empty volume",
                types.len(),
                self.cell_type
            );
        }

        compress_list(&cells, &cell_map)?;
        compress_list(&cell_facets, &facet_map)?;
        compress_list(&cell_corners, &corner_map)?;

        let mesh = Volume::from_parts(self.cell_type, point_set, incidence)?;
        attach_all::<category::Points, _>(&mesh, &points)?;
        attach_all::<category::Cells, _>(&mesh, &cells)?;
        attach_all::<category::CellFacets, _>(&mesh, &cell_facets)?;
        attach_all::<category::CellCorners, _>(&mesh, &cell_corners)?;

        log::info!(
            "geogram: read volume with {} vertices, {} {} cells",
            mesh.nverts(),
            mesh.ncells(),
            self.cell_type
        );
        Ok(MeshData {
            mesh,
            attributes: VolumeAttributes {
                points,
                cells,
                cell_facets,
                cell_corners,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Options of [`GeogramWriter`].
#[derive(Clone, Copy, Debug)]
pub struct GeogramWriteOptions {
    pub compression: Compression,
    /// Store `corner_adjacent_facet` so other tools get surface adjacency
    /// without rebuilding it.
    pub write_corner_adjacency: bool,
}

impl Default for GeogramWriteOptions {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            write_corner_adjacency: true,
        }
    }
}

/// Geogram writer for polylines, surfaces and volumes.
#[derive(Clone, Copy, Debug, Default)]
pub struct GeogramWriter {
    pub options: GeogramWriteOptions,
}

impl GeogramWriter {
    pub fn new(options: GeogramWriteOptions) -> Self {
        Self { options }
    }

    fn start<W: Write>(&self, writer: W) -> Result<ChunkWriter<GzEncoder<W>>, MeshError> {
        let mut out = ChunkWriter::new(GzEncoder::new(writer, self.options.compression));
        out.head()?;
        Ok(out)
    }
}

/// Write the storable attributes of `list` on `set`, warning about the rest.
fn write_list<W: Write>(
    out: &mut ChunkWriter<W>,
    set: ElementSet,
    list: &[NamedAttribute],
) -> Result<(), MeshError> {
    for (name, container) in list {
        match Encoded::container(container)? {
            Some(values) => out.attribute(set, name, &values)?,
            None => log::warn!(
                "geogram: skipping `{name}`: element type {} cannot be stored",
                container.borrow().type_name()
            ),
        }
    }
    Ok(())
}

impl MeshWriter<PolyLine> for GeogramWriter {
    type Attributes = PolyLineAttributes;

    fn write<W: Write>(
        &self,
        writer: W,
        m: &PolyLine,
        attributes: &PolyLineAttributes,
    ) -> Result<(), MeshError> {
        check_list(&attributes.points, m.nverts())?;
        check_list(&attributes.edges, m.nedges())?;

        let mut out = self.start(writer)?;
        out.set_size(ElementSet::Vertices, m.nverts())?;
        out.attribute(ElementSet::Vertices, POINT, &Encoded::points(m.points().as_slice()))?;

        out.set_size(ElementSet::Edges, m.nedges())?;
        let mut edge_vertex = Encoded::indices(m.incidence().iter().copied())?;
        edge_vertex.dimension = 2;
        out.attribute(ElementSet::Edges, EDGE_VERTEX, &edge_vertex)?;

        write_list(&mut out, ElementSet::Vertices, &attributes.points)?;
        write_list(&mut out, ElementSet::Edges, &attributes.edges)?;
        out.into_inner().finish()?;

        log::info!(
            "geogram: wrote polyline with {} vertices, {} edges",
            m.nverts(),
            m.nedges()
        );
        Ok(())
    }
}

impl<L: FacetLayout> MeshWriter<Surface<L>> for GeogramWriter {
    type Attributes = SurfaceAttributes;

    fn write<W: Write>(
        &self,
        writer: W,
        m: &Surface<L>,
        attributes: &SurfaceAttributes,
    ) -> Result<(), MeshError> {
        check_list(&attributes.points, m.nverts())?;
        check_list(&attributes.facets, m.nfacets())?;
        check_list(&attributes.corners, m.ncorners())?;

        let mut out = self.start(writer)?;
        out.set_size(ElementSet::Vertices, m.nverts())?;
        out.attribute(ElementSet::Vertices, POINT, &Encoded::points(m.points().as_slice()))?;

        out.set_size(ElementSet::Facets, m.nfacets())?;
        let facet_ptr = Encoded::indices((0..m.nfacets()).map(|f| m.corners(f).start))?;
        out.attribute(ElementSet::Facets, FACET_PTR, &facet_ptr)?;

        out.set_size(ElementSet::FacetCorners, m.ncorners())?;
        let corner_vertex = Encoded::indices(m.incidence().iter().copied())?;
        out.attribute(ElementSet::FacetCorners, FACET_CORNER_VERTEX, &corner_vertex)?;

        if self.options.write_corner_adjacency {
            let built;
            let conn = match m.connectivity() {
                Some(conn) => conn,
                None => {
                    built = SurfaceConnectivity::build(m);
                    &built
                }
            };
            let adj = Adjacency::new(m, conn);
            let mut values = Encoded::indices(std::iter::empty())?;
            for c in 0..m.ncorners() {
                let f = match adj.opposite(c) {
                    Some(opp) => len_u32(adj.facet(opp))?,
                    None => u32::MAX,
                };
                values.bytes.extend_from_slice(&f.to_le_bytes());
            }
            out.attribute(ElementSet::FacetCorners, CORNER_ADJACENT_FACET, &values)?;
        }

        write_list(&mut out, ElementSet::Vertices, &attributes.points)?;
        write_list(&mut out, ElementSet::Facets, &attributes.facets)?;
        write_list(&mut out, ElementSet::FacetCorners, &attributes.corners)?;
        out.into_inner().finish()?;

        log::info!(
            "geogram: wrote surface with {} vertices, {} facets",
            m.nverts(),
            m.nfacets()
        );
        Ok(())
    }
}

impl MeshWriter<Volume> for GeogramWriter {
    type Attributes = VolumeAttributes;

    fn write<W: Write>(
        &self,
        writer: W,
        m: &Volume,
        attributes: &VolumeAttributes,
    ) -> Result<(), MeshError> {
        check_list(&attributes.points, m.nverts())?;
        check_list(&attributes.cells, m.ncells())?;
        check_list(&attributes.cell_facets, m.nfacets())?;
        check_list(&attributes.cell_corners, m.ncorners())?;

        let mut out = self.start(writer)?;
        out.set_size(ElementSet::Vertices, m.nverts())?;
        out.attribute(ElementSet::Vertices, POINT, &Encoded::points(m.points().as_slice()))?;

        out.set_size(ElementSet::Cells, m.ncells())?;
        let code = m.cell_type().code() as u8;
        let cell_type = Encoded {
            element_type: "char",
            element_size: 1,
            dimension: 1,
            bytes: vec![code; m.ncells()],
        };
        out.attribute(ElementSet::Cells, CELL_TYPE, &cell_type)?;
        let nv = m.nverts_per_cell();
        out.attribute(
            ElementSet::Cells,
            CELL_PTR,
            &Encoded::indices((0..m.ncells()).map(|c| c * nv))?,
        )?;

        out.set_size(ElementSet::CellFacets, m.nfacets())?;
        out.set_size(ElementSet::CellCorners, m.ncorners())?;
        out.attribute(
            ElementSet::CellCorners,
            CELL_CORNER_VERTEX,
            &Encoded::indices(m.incidence().iter().copied())?,
        )?;

        write_list(&mut out, ElementSet::Vertices, &attributes.points)?;
        write_list(&mut out, ElementSet::Cells, &attributes.cells)?;
        write_list(&mut out, ElementSet::CellFacets, &attributes.cell_facets)?;
        write_list(&mut out, ElementSet::CellCorners, &attributes.cell_corners)?;
        out.into_inner().finish()?;

        log::info!(
            "geogram: wrote volume with {} vertices, {} {} cells",
            m.nverts(),
            m.ncells(),
            m.cell_type()
        );
        Ok(())
    }
}

/// Read a surface and its attributes from a `.geogram` file.
pub fn read_geogram<L: FacetLayout>(
    path: impl AsRef<Path>,
) -> Result<MeshData<Surface<L>, SurfaceAttributes>, MeshError> {
    read_file(&GeogramReader, path)
}

/// Read a polyline and its attributes from a `.geogram` file.
pub fn read_geogram_polyline(
    path: impl AsRef<Path>,
) -> Result<MeshData<PolyLine, PolyLineAttributes>, MeshError> {
    read_file(&GeogramPolyLineReader, path)
}

/// Read the `cell_type` cells of a `.geogram` file.
pub fn read_geogram_volume(
    path: impl AsRef<Path>,
    cell_type: CellType,
) -> Result<MeshData<Volume, VolumeAttributes>, MeshError> {
    read_file(&GeogramVolumeReader::new(cell_type), path)
}

/// Write a surface and its attributes to a `.geogram` file.
pub fn write_geogram<L: FacetLayout>(
    path: impl AsRef<Path>,
    m: &Surface<L>,
    attributes: &SurfaceAttributes,
) -> Result<(), MeshError> {
    write_file(&GeogramWriter::default(), path, m, attributes)
}

/// Write a polyline and its attributes to a `.geogram` file.
pub fn write_geogram_polyline(
    path: impl AsRef<Path>,
    m: &PolyLine,
    attributes: &PolyLineAttributes,
) -> Result<(), MeshError> {
    write_file(&GeogramWriter::default(), path, m, attributes)
}

/// Write a volume and its attributes to a `.geogram` file.
pub fn write_geogram_volume(
    path: impl AsRef<Path>,
    m: &Volume,
    attributes: &VolumeAttributes,
) -> Result<(), MeshError> {
    write_file(&GeogramWriter::default(), path, m, attributes)
}
