//! GLB container parsing and assembly.
//!
//! A GLB file is a 12-byte header (`magic`, `version`, `length`) followed by
//! a stream of chunks, each an 8-byte header (`length`, `type`) plus payload
//! padded to a 4-byte boundary. Avatar files carry one JSON chunk and at most
//! one BIN chunk.
//!
//! ```ignore
//! use vrm_core::container::GlbContainer;
//!
//! let data = std::fs::read("avatar.vrm")?;
//! let container = GlbContainer::parse(&data)?;
//! println!("{} meshes", container.document().meshes.len());
//! ```

use byteorder::{ByteOrder, LittleEndian};

use crate::document::Document;
use crate::error::FormatError;

pub const GLB_MAGIC: u32 = 0x46546C67; // "glTF" in little-endian
pub const GLB_VERSION: u32 = 2;
pub const GLB_CHUNK_JSON: u32 = 0x4E4F534A; // "JSON"
pub const GLB_CHUNK_BIN: u32 = 0x004E4942; // "BIN\0"

const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

/// Chunk type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    Json,
    Bin,
    Unknown(u32),
}

impl ChunkKind {
    pub fn from_u32(value: u32) -> Self {
        match value {
            GLB_CHUNK_JSON => ChunkKind::Json,
            GLB_CHUNK_BIN => ChunkKind::Bin,
            other => ChunkKind::Unknown(other),
        }
    }

    pub fn to_u32(self) -> u32 {
        match self {
            ChunkKind::Json => GLB_CHUNK_JSON,
            ChunkKind::Bin => GLB_CHUNK_BIN,
            ChunkKind::Unknown(other) => other,
        }
    }

    /// Byte used to pad the chunk payload to a 4-byte boundary.
    fn padding_byte(self) -> u8 {
        match self {
            ChunkKind::Json => b' ',
            _ => 0,
        }
    }
}

/// A chunk payload borrowed from the container bytes (padding excluded).
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    pub kind: ChunkKind,
    pub data: &'a [u8],
}

/// Parsed GLB container.
///
/// Borrows the input bytes: the BIN chunk is never copied, so a loaded file
/// must outlive the container.
#[derive(Debug)]
pub struct GlbContainer<'a> {
    version: u32,
    total_length: u32,
    chunks: Vec<Chunk<'a>>,
    json_chunk: &'a [u8],
    bin_chunk: Option<&'a [u8]>,
    document: Document,
}

impl<'a> GlbContainer<'a> {
    /// Parse from GLB binary data.
    pub fn parse(data: &'a [u8]) -> Result<Self, FormatError> {
        if data.len() < HEADER_LEN {
            return Err(FormatError::TooSmall(data.len()));
        }

        let magic = LittleEndian::read_u32(&data[0..4]);
        let version = LittleEndian::read_u32(&data[4..8]);
        let total_length = LittleEndian::read_u32(&data[8..12]);

        if magic != GLB_MAGIC {
            return Err(FormatError::BadMagic(magic));
        }
        if version != GLB_VERSION {
            return Err(FormatError::UnsupportedVersion(version));
        }
        if total_length as usize != data.len() {
            return Err(FormatError::LengthMismatch {
                declared: total_length,
                actual: data.len(),
            });
        }

        let mut offset = HEADER_LEN;
        let mut chunks = Vec::new();
        let mut json_chunk: Option<&'a [u8]> = None;
        let mut bin_chunk: Option<&'a [u8]> = None;

        while offset < data.len() {
            if offset + CHUNK_HEADER_LEN > data.len() {
                return Err(FormatError::TruncatedChunkHeader { offset });
            }

            let chunk_length = LittleEndian::read_u32(&data[offset..offset + 4]);
            let kind = ChunkKind::from_u32(LittleEndian::read_u32(&data[offset + 4..offset + 8]));
            let start = offset + CHUNK_HEADER_LEN;
            let end = start
                .checked_add(chunk_length as usize)
                .filter(|&end| end <= data.len())
                .ok_or(FormatError::ChunkOverrun {
                    offset,
                    length: chunk_length,
                    file_len: data.len(),
                })?;

            let payload = &data[start..end];
            match kind {
                ChunkKind::Json => {
                    if json_chunk.replace(payload).is_some() {
                        return Err(FormatError::DuplicateJsonChunk);
                    }
                }
                ChunkKind::Bin => {
                    if bin_chunk.replace(payload).is_some() {
                        return Err(FormatError::DuplicateBinChunk);
                    }
                }
                ChunkKind::Unknown(tag) => {
                    tracing::warn!("skipping unknown GLB chunk type 0x{:08X} ({} bytes)", tag, chunk_length);
                }
            }
            chunks.push(Chunk { kind, data: payload });

            offset = align4(end);
        }

        let json_chunk = json_chunk.ok_or(FormatError::MissingJsonChunk)?;
        let document = Document::from_slice(trim_json_padding(json_chunk))?;

        tracing::debug!(
            "parsed GLB v{}: {} bytes, JSON {} bytes, BIN {}",
            version,
            total_length,
            json_chunk.len(),
            bin_chunk.map_or_else(|| "absent".to_string(), |b| format!("{} bytes", b.len()))
        );

        Ok(Self {
            version,
            total_length,
            chunks,
            json_chunk,
            bin_chunk,
            document,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn total_length(&self) -> u32 {
        self.total_length
    }

    /// All chunks in file order, unknown types included.
    pub fn chunks(&self) -> &[Chunk<'a>] {
        &self.chunks
    }

    /// Raw JSON chunk payload.
    pub fn json_chunk(&self) -> &'a [u8] {
        self.json_chunk
    }

    /// Borrowed BIN chunk payload, if the file has one.
    pub fn bin_chunk(&self) -> Option<&'a [u8]> {
        self.bin_chunk
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Consume the container, keeping the parsed document and BIN view.
    pub fn into_parts(self) -> (Document, Option<&'a [u8]>) {
        (self.document, self.bin_chunk)
    }

    /// Re-serialize header and chunks.
    ///
    /// Payloads are re-padded to 4 bytes, so a file whose chunks were already
    /// aligned reproduces its original length.
    pub fn to_bytes(&self) -> Vec<u8> {
        assemble(self.chunks.iter().map(|c| (c.kind, c.data)))
    }
}

/// Assemble a GLB file from a JSON document and an optional binary payload.
pub fn write_glb(json: &[u8], bin: Option<&[u8]>) -> Vec<u8> {
    let chunks = std::iter::once((ChunkKind::Json, json)).chain(bin.map(|b| (ChunkKind::Bin, b)));
    assemble(chunks)
}

fn assemble<'b>(chunks: impl Iterator<Item = (ChunkKind, &'b [u8])> + Clone) -> Vec<u8> {
    let total_len = HEADER_LEN
        + chunks
            .clone()
            .map(|(_, data)| CHUNK_HEADER_LEN + align4(data.len()))
            .sum::<usize>();

    let mut output = Vec::with_capacity(total_len);

    // Header
    output.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    output.extend_from_slice(&GLB_VERSION.to_le_bytes());
    output.extend_from_slice(&(total_len as u32).to_le_bytes());

    for (kind, data) in chunks {
        let padded_len = align4(data.len());
        output.extend_from_slice(&(padded_len as u32).to_le_bytes());
        output.extend_from_slice(&kind.to_u32().to_le_bytes());
        output.extend_from_slice(data);
        output.resize(output.len() + (padded_len - data.len()), kind.padding_byte());
    }

    output
}

#[inline]
fn align4(value: usize) -> usize {
    (value + 3) & !3
}

/// Strips the trailing spaces or NULs exporters use to pad the JSON chunk.
fn trim_json_padding(json: &[u8]) -> &[u8] {
    let end = json
        .iter()
        .rposition(|&b| !matches!(b, b' ' | b'\0' | b'\n' | b'\r' | b'\t'))
        .map_or(0, |i| i + 1);
    &json[..end]
}
