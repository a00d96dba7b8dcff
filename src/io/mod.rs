//! Mesh readers and writers.
//!
//! Every format implements [`MeshReader`] and/or [`MeshWriter`] for the
//! containers it can carry. Readers build a fresh container and only return
//! it on success; on error nothing is left half-filled. Named attributes
//! travel next to the mesh in per-category lists ([`PolyLineAttributes`],
//! [`SurfaceAttributes`], [`VolumeAttributes`]) and are already registered with the returned
//! container, so they follow its later edits.

pub mod geogram;
pub mod obj;

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::data::attribute::{AttributeOwner, NamedAttribute};
use crate::mesh_error::MeshError;

/// A mesh plus the attributes read alongside it.
#[derive(Debug)]
pub struct MeshData<M, A> {
    pub mesh: M,
    pub attributes: A,
}

/// Trait for readers that produce a mesh of type `M`.
pub trait MeshReader<M> {
    /// Attribute lists returned next to the mesh.
    type Attributes;

    /// Parse a mesh from `reader`.
    fn read<R: Read>(&self, reader: R) -> Result<MeshData<M, Self::Attributes>, MeshError>;
}

/// Trait for writers that serialize a mesh of type `M`.
pub trait MeshWriter<M> {
    /// Attribute lists written next to the mesh.
    type Attributes;

    fn write<W: Write>(
        &self,
        writer: W,
        mesh: &M,
        attributes: &Self::Attributes,
    ) -> Result<(), MeshError>;
}

/// Named attributes of a polyline, per element category.
#[derive(Clone, Default)]
pub struct PolyLineAttributes {
    pub points: Vec<NamedAttribute>,
    pub edges: Vec<NamedAttribute>,
}

/// Named attributes of a surface, per element category.
#[derive(Clone, Default)]
pub struct SurfaceAttributes {
    pub points: Vec<NamedAttribute>,
    pub facets: Vec<NamedAttribute>,
    pub corners: Vec<NamedAttribute>,
}

/// Named attributes of a volume, per element category.
#[derive(Clone, Default)]
pub struct VolumeAttributes {
    pub points: Vec<NamedAttribute>,
    pub cells: Vec<NamedAttribute>,
    pub cell_facets: Vec<NamedAttribute>,
    pub cell_corners: Vec<NamedAttribute>,
}

struct Names<'a>(&'a [NamedAttribute]);

impl fmt::Debug for Names<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.0.iter().map(|(name, c)| format!("{name}: {}", c.borrow().type_name())))
            .finish()
    }
}

impl fmt::Debug for PolyLineAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolyLineAttributes")
            .field("points", &Names(&self.points))
            .field("edges", &Names(&self.edges))
            .finish()
    }
}

impl fmt::Debug for SurfaceAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceAttributes")
            .field("points", &Names(&self.points))
            .field("facets", &Names(&self.facets))
            .field("corners", &Names(&self.corners))
            .finish()
    }
}

impl fmt::Debug for VolumeAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VolumeAttributes")
            .field("points", &Names(&self.points))
            .field("cells", &Names(&self.cells))
            .field("cell_facets", &Names(&self.cell_facets))
            .field("cell_corners", &Names(&self.cell_corners))
            .finish()
    }
}

/// Register every container of `list` with `owner`.
pub(crate) fn attach_all<C, O: AttributeOwner<C>>(
    owner: &O,
    list: &[NamedAttribute],
) -> Result<(), MeshError> {
    for (name, container) in list {
        owner.attach(name, container)?;
    }
    Ok(())
}

/// Fail if an attribute of `list` does not hold `expected` entries.
pub(crate) fn check_list(list: &[NamedAttribute], expected: usize) -> Result<(), MeshError> {
    for (name, container) in list {
        let found = container.borrow().len();
        if found != expected {
            return Err(MeshError::AttributeSizeMismatch {
                name: name.clone(),
                expected,
                found,
            });
        }
    }
    Ok(())
}

/// Open `path` and read it with `reader`.
pub fn read_file<M, Rd: MeshReader<M>>(
    reader: &Rd,
    path: impl AsRef<Path>,
) -> Result<MeshData<M, Rd::Attributes>, MeshError> {
    let file = File::open(path)?;
    reader.read(BufReader::new(file))
}

/// Create (or truncate) `path` and write `mesh` into it with `writer`.
pub fn write_file<M, Wr: MeshWriter<M>>(
    writer: &Wr,
    path: impl AsRef<Path>,
    mesh: &M,
    attributes: &Wr::Attributes,
) -> Result<(), MeshError> {
    let mut out = BufWriter::new(File::create(path)?);
    writer.write(&mut out, mesh, attributes)?;
    out.flush()?;
    Ok(())
}
