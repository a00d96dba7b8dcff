//! MeshError: unified error type for the recoverable paths of mesh-kernel.
//!
//! Kernel invariant violations (mutating a connected surface, reading an
//! attribute as the wrong type, deleting a referenced vertex) are programmer
//! errors and panic. This type covers everything that may legitimately fail
//! at a call boundary: file I/O, malformed exchange data, and the `try_*`
//! validators that report an invariant violation instead of panicking.

use thiserror::Error;

/// Unified error type for mesh-kernel operations.
#[derive(Debug, Error)]
pub enum MeshError {
    /// Underlying reader/writer failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed text or binary mesh data.
    #[error("mesh parse error: {0}")]
    MeshIoParse(String),

    /// The first chunk of a binary mesh is not `HEAD`.
    #[error("binary mesh does not start with a HEAD chunk (found `{0}`)")]
    MissingHead(String),

    /// The `HEAD` chunk carries the wrong magic string.
    #[error("not a GEOGRAM file (magic `{0}`)")]
    NotGeogram(String),

    /// The bytes consumed by a chunk differ from its declared length.
    #[error("chunk `{tag}` size mismatch: expected {expected} bytes, got {found}")]
    ChunkSizeMismatch {
        tag: String,
        expected: u64,
        found: u64,
    },

    /// An `ATTR` chunk references a set whose size was never declared.
    #[error("attribute `{name}` targets undeclared element set `{set}`")]
    UndeclaredElementSet { set: String, name: String },

    /// A structural attribute has the wrong number of entries.
    #[error("attribute `{name}`: expected {expected} entries, found {found}")]
    AttributeSizeMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    /// A required named attribute is absent.
    #[error("missing attribute `{0}`")]
    MissingAttribute(String),

    /// A type-erased attribute was requested as another element type.
    #[error("attribute type mismatch: stored `{stored}`, requested `{requested}`")]
    AttributeTypeMismatch {
        stored: &'static str,
        requested: &'static str,
    },

    /// An exchange file declares a cell type code the kernel does not know.
    #[error("unsupported cell type code {0}")]
    UnsupportedCellType(i32),

    /// Facets of a fixed-arity surface do not all have the expected size.
    #[error("facet {facet} has {found} corners, expected {expected}")]
    NonUniformFacets {
        facet: usize,
        expected: usize,
        found: usize,
    },

    /// A vertex marked for deletion is still used by a surviving element.
    #[error("vertex {vertex} is still referenced by element {element}")]
    VertexStillReferenced { vertex: usize, element: usize },

    /// An incidence entry points past the end of the point set.
    #[error("corner {corner} references vertex {vertex} but only {nverts} vertices exist")]
    InvalidIncidence {
        corner: usize,
        vertex: usize,
        nverts: usize,
    },

    /// The incidence length is incompatible with the container layout.
    #[error("incidence length {len} is not compatible with the facet layout ({details})")]
    InvalidLayout { len: usize, details: String },

    /// A live attribute is out of sync with its owner's element count.
    #[error("attribute registry `{registry}`: live attribute of length {found}, owner holds {expected}")]
    AttributeLengthMismatch {
        registry: &'static str,
        expected: usize,
        found: usize,
    },

    /// Derived adjacency no longer matches the incidence it was built from.
    #[error("connectivity out of date: {0}")]
    StaleConnectivity(String),

    /// The implicit tree of a box hierarchy is inconsistent.
    #[error("box hierarchy inconsistent: {0}")]
    InvalidHierarchy(String),
}
