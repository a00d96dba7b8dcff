//! Wavefront `.obj` reader and writer.
//!
//! # Supported format
//! - `v x y z` vertex lines and `f i j k ...` face lines.
//! - Face tokens may be `i`, `i/t`, `i//n` or `i/t/n`; only the vertex index
//!   is kept. Negative indices count back from the last vertex read.
//!
//! # Limitations
//! - Texture coordinates, normals, groups and materials are ignored.
//! - No attributes are read or written.

use std::io::{Read, Write};
use std::path::Path;

use itertools::Itertools;

use crate::data::point_set::PointSet;
use crate::geometry::Vec3;
use crate::io::{MeshData, MeshReader, MeshWriter, read_file, write_file};
use crate::mesh_error::MeshError;
use crate::topology::layout::FacetLayout;
use crate::topology::surface::{Polygons, Surface};

/// Wavefront reader. Reads into any facet layout; a fixed layout rejects
/// faces of another size.
#[derive(Debug, Default, Clone)]
pub struct ObjReader;

impl ObjReader {
    fn parse_coord(raw: Option<&str>, line: usize) -> Result<f64, MeshError> {
        let raw = raw.ok_or_else(|| {
            MeshError::MeshIoParse(format!("line {line}: vertex needs three coordinates"))
        })?;
        raw.parse::<f64>()
            .map_err(|_| MeshError::MeshIoParse(format!("line {line}: invalid coordinate: {raw}")))
    }

    /// 0-based vertex index of a face token, given `nverts` vertices so far.
    fn parse_index(token: &str, nverts: usize, line: usize) -> Result<usize, MeshError> {
        let raw = token.split('/').next().unwrap_or(token);
        let i = raw
            .parse::<i64>()
            .map_err(|_| MeshError::MeshIoParse(format!("line {line}: invalid index: {token}")))?;
        let resolved = match i {
            0 => None,
            i if i > 0 => Some(i - 1),
            i => Some(nverts as i64 + i),
        };
        resolved
            .filter(|&v| v >= 0)
            .map(|v| v as usize)
            .ok_or_else(|| MeshError::MeshIoParse(format!("line {line}: bad vertex index {i}")))
    }
}

impl<L: FacetLayout> MeshReader<Surface<L>> for ObjReader {
    type Attributes = ();

    fn read<R: Read>(&self, mut reader: R) -> Result<MeshData<Surface<L>, ()>, MeshError> {
        let mut contents = String::new();
        reader.read_to_string(&mut contents)?;

        let mut coords: Vec<Vec3> = Vec::new();
        let mut offsets = vec![0];
        let mut incidence = Vec::new();
        for (lineno, line) in contents.lines().enumerate() {
            let line_no = lineno + 1;
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some("v") => {
                    let x = Self::parse_coord(tokens.next(), line_no)?;
                    let y = Self::parse_coord(tokens.next(), line_no)?;
                    let z = Self::parse_coord(tokens.next(), line_no)?;
                    coords.push(Vec3::new(x, y, z));
                }
                Some("f") => {
                    let start = incidence.len();
                    for token in tokens {
                        incidence.push(Self::parse_index(token, coords.len(), line_no)?);
                    }
                    if incidence.len() - start < 3 {
                        return Err(MeshError::MeshIoParse(format!(
                            "line {line_no}: face with fewer than three vertices"
                        )));
                    }
                    offsets.push(incidence.len());
                }
                _ => {}
            }
        }

        let mesh = Surface::from_parts(PointSet::from_coords(coords), &offsets, incidence)?;
        log::info!(
            "obj: read {} vertices, {} facets",
            mesh.nverts(),
            mesh.nfacets()
        );
        Ok(MeshData {
            mesh,
            attributes: (),
        })
    }
}

/// Options of [`ObjWriter`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ObjWriteOptions {
    /// Digits after the decimal point; `None` writes the shortest text that
    /// reads back to the same `f64`.
    pub precision: Option<usize>,
}

/// Wavefront writer.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjWriter {
    pub options: ObjWriteOptions,
}

impl ObjWriter {
    pub fn new(options: ObjWriteOptions) -> Self {
        Self { options }
    }

    fn write_coord<W: Write>(&self, w: &mut W, x: f64) -> std::io::Result<()> {
        match self.options.precision {
            Some(p) => write!(w, " {x:.p$}"),
            None => write!(w, " {x}"),
        }
    }
}

impl<L: FacetLayout> MeshWriter<Surface<L>> for ObjWriter {
    type Attributes = ();

    fn write<W: Write>(&self, mut writer: W, m: &Surface<L>, _: &()) -> Result<(), MeshError> {
        for p in m.points() {
            writer.write_all(b"v")?;
            for x in p.iter() {
                self.write_coord(&mut writer, *x)?;
            }
            writer.write_all(b"\n")?;
        }
        for f in 0..m.nfacets() {
            let verts = m.facet_vertices(f).iter().map(|v| v + 1).join(" ");
            writeln!(writer, "f {verts}")?;
        }
        log::info!(
            "obj: wrote {} vertices, {} facets",
            m.nverts(),
            m.nfacets()
        );
        Ok(())
    }
}

/// Read a polygonal surface from a `.obj` file.
pub fn read_wavefront_obj(path: impl AsRef<Path>) -> Result<Polygons, MeshError> {
    Ok(read_file::<Polygons, _>(&ObjReader, path)?.mesh)
}

/// Write `m` to a `.obj` file with default options.
pub fn write_wavefront_obj<L: FacetLayout>(
    path: impl AsRef<Path>,
    m: &Surface<L>,
) -> Result<(), MeshError> {
    write_file(&ObjWriter::default(), path, m, &())
}
