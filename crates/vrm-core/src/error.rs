//! Error types for avatar loading.
//!
//! Two failure families exist. [`FormatError`] covers a malformed binary
//! container. [`ValidationError`] covers a well-formed container whose
//! document leaves the supported single-buffer, single-skin subset. Both are
//! fatal to the current load; [`LoadError`] wraps them together with I/O
//! failures for callers that drive a whole load.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Malformed GLB container.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("container: file too small for GLB header ({0} bytes)")]
    TooSmall(usize),

    #[error("container: invalid magic 0x{0:08X} (expected \"glTF\")")]
    BadMagic(u32),

    #[error("container: unsupported GLB version {0} (only 2 is supported)")]
    UnsupportedVersion(u32),

    #[error("container: declared length {declared} does not match file size {actual}")]
    LengthMismatch { declared: u32, actual: usize },

    #[error("container: truncated chunk header at byte {offset}")]
    TruncatedChunkHeader { offset: usize },

    #[error("container: chunk at byte {offset} claims {length} bytes, past file end {file_len}")]
    ChunkOverrun {
        offset: usize,
        length: u32,
        file_len: usize,
    },

    #[error("container: multiple JSON chunks found")]
    DuplicateJsonChunk,

    #[error("container: multiple BIN chunks found")]
    DuplicateBinChunk,

    #[error("container: missing JSON chunk")]
    MissingJsonChunk,

    /// The JSON chunk is not valid JSON, or it does not fit the document
    /// model: a wrong value type such as a string `count` lands here with
    /// serde's line and column, not as a [`ValidationError`]. Validation
    /// errors only cover documents that deserialize.
    #[error("container: failed to decode JSON chunk: {0}")]
    Json(#[from] serde_json::Error),
}

/// Document outside the supported subset, or internally inconsistent.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("document declares {0} buffers; only single-buffer files are supported")]
    BufferCount(usize),

    #[error("document references binary data but the container has no BIN chunk")]
    MissingBinaryChunk,

    #[error("{kind} {index} does not exist")]
    MissingReference { kind: &'static str, index: usize },

    #[error("buffer view {buffer_view} references buffer {buffer}; only buffer 0 is supported")]
    UnsupportedBuffer { buffer_view: usize, buffer: usize },

    #[error("accessor {accessor} has no buffer view")]
    MissingBufferView { accessor: usize },

    #[error("accessor {accessor} is sparse; sparse accessors are not supported")]
    SparseAccessor { accessor: usize },

    #[error("accessor {accessor} has unsupported component type {component_type}")]
    UnsupportedComponentType { accessor: usize, component_type: u32 },

    #[error("accessor {accessor} has unsupported element type {shape:?}")]
    UnsupportedElementShape { accessor: usize, shape: String },

    #[error("buffer view {buffer_view} stride {stride} is smaller than element size {element_size}")]
    InvalidStride {
        buffer_view: usize,
        stride: usize,
        element_size: usize,
    },

    #[error("buffer view {buffer_view} ends at byte {end}, past BIN chunk length {available}")]
    BufferViewBounds {
        buffer_view: usize,
        end: usize,
        available: usize,
    },

    #[error("accessor {accessor} read exceeds buffer bounds (row {row} ends at byte {end}, {available} available)")]
    AccessorBounds {
        accessor: usize,
        row: usize,
        end: usize,
        available: usize,
    },

    #[error("accessor {accessor} is {found}, expected {expected}")]
    UnexpectedShape {
        accessor: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("accessor {accessor} holds {found} components, expected {expected}")]
    UnexpectedComponentType {
        accessor: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("mesh {mesh} primitive {primitive} has no {attribute} attribute")]
    MissingAttribute {
        mesh: usize,
        primitive: usize,
        attribute: &'static str,
    },

    #[error("mesh {mesh} primitive {primitive} has {present} without {missing}")]
    UnpairedSkinAttributes {
        mesh: usize,
        primitive: usize,
        present: &'static str,
        missing: &'static str,
    },

    #[error("mesh {mesh} primitive {primitive} attribute {attribute} has {found} rows, expected {expected}")]
    AttributeCountMismatch {
        mesh: usize,
        primitive: usize,
        attribute: String,
        expected: usize,
        found: usize,
    },

    #[error("mesh {mesh} primitive {primitive} uses mode {mode}; only TRIANGLES (4) is supported")]
    UnsupportedPrimitiveMode {
        mesh: usize,
        primitive: usize,
        mode: u32,
    },

    #[error("mesh {mesh} primitive {primitive} index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        mesh: usize,
        primitive: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("mesh {mesh} primitive {primitive} morph target {target:?} has {found} deltas, expected {expected}")]
    MorphTargetCountMismatch {
        mesh: usize,
        primitive: usize,
        target: String,
        expected: usize,
        found: usize,
    },

    #[error("mesh {mesh} primitive {primitive} declares morph target {name:?} twice")]
    DuplicateMorphTarget {
        mesh: usize,
        primitive: usize,
        name: String,
    },

    #[error("no primitive with morph targets found{}", .mesh_name.as_ref().map(|n| format!(" in mesh {:?}", n)).unwrap_or_default())]
    NoMorphPrimitive { mesh_name: Option<String> },

    #[error("texture {0} has no image source")]
    TextureWithoutSource(usize),

    #[error("image {0} has neither a buffer view nor a URI")]
    ImageWithoutData(usize),

    #[error("image {image} URI {uri:?} {reason}")]
    InvalidImageUri {
        image: usize,
        uri: String,
        reason: &'static str,
    },

    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("skin {0} has no joints")]
    EmptySkin(usize),

    #[error("skin {skin} has {found} inverse bind matrices for {expected} joints")]
    InverseBindCount {
        skin: usize,
        expected: usize,
        found: usize,
    },

    #[error("node {node} is a child of both node {first} and node {second}")]
    NodeHasMultipleParents {
        node: usize,
        first: usize,
        second: usize,
    },

    #[error("skin {skin} joint hierarchy contains a cycle through node {node}")]
    JointCycle { skin: usize, node: usize },

    #[error("joint {joint} does not exist in a skeleton of {len} joints")]
    JointOutOfRange { joint: usize, len: usize },

    #[error("document declares {0} skins; select one explicitly")]
    MultipleSkins(usize),
}

/// Any failure of a complete load.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to read external image {path:?}: {source}")]
    ExternalImage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, LoadError>;
