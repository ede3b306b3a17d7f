//! GLB container parsing against hand-assembled byte streams.

mod common;

use vrm_core::container::{ChunkKind, GLB_CHUNK_BIN, GLB_CHUNK_JSON, GLB_MAGIC};
use vrm_core::{write_glb, FormatError, GlbContainer};

const JSON: &[u8] = br#"{"asset":{"version":"2.0"},"buffers":[{"byteLength":8}]}"#;

fn header(magic: u32, version: u32, length: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&magic.to_le_bytes());
    out.extend_from_slice(&version.to_le_bytes());
    out.extend_from_slice(&length.to_le_bytes());
    out
}

fn chunk(kind: u32, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&kind.to_le_bytes());
    out.extend_from_slice(data);
    out
}

/// Concatenate chunks behind a header carrying the correct total length.
fn glb_from_chunks(chunks: &[Vec<u8>]) -> Vec<u8> {
    let body: Vec<u8> = chunks.concat();
    let mut out = header(GLB_MAGIC, 2, (12 + body.len()) as u32);
    out.extend_from_slice(&body);
    out
}

fn padded_json() -> Vec<u8> {
    let mut json = JSON.to_vec();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    json
}

#[test]
fn test_total_length_matches_file() {
    let glb = common::quad_glb();
    let container = GlbContainer::parse(&glb).unwrap();
    assert_eq!(container.total_length() as usize, glb.len());
    assert_eq!(container.to_bytes(), glb);
}

#[test]
fn test_chunks_in_file_order() {
    let glb = write_glb(JSON, Some(&[0u8; 8]));
    let container = GlbContainer::parse(&glb).unwrap();
    let kinds: Vec<ChunkKind> = container.chunks().iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![ChunkKind::Json, ChunkKind::Bin]);
    assert_eq!(container.bin_chunk().map(<[u8]>::len), Some(8));
}

#[test]
fn test_bad_magic() {
    let mut glb = write_glb(JSON, None);
    glb[0..4].copy_from_slice(b"GLTF");
    assert!(matches!(GlbContainer::parse(&glb), Err(FormatError::BadMagic(_))));
}

#[test]
fn test_unsupported_version() {
    let mut glb = write_glb(JSON, None);
    glb[4..8].copy_from_slice(&1u32.to_le_bytes());
    assert!(matches!(
        GlbContainer::parse(&glb),
        Err(FormatError::UnsupportedVersion(1))
    ));
}

#[test]
fn test_length_mismatch() {
    let mut glb = write_glb(JSON, None);
    let declared = glb.len() as u32 + 4;
    glb[8..12].copy_from_slice(&declared.to_le_bytes());
    assert!(matches!(
        GlbContainer::parse(&glb),
        Err(FormatError::LengthMismatch { .. })
    ));
}

#[test]
fn test_too_small() {
    assert!(matches!(GlbContainer::parse(b"glTF"), Err(FormatError::TooSmall(4))));
}

#[test]
fn test_chunk_overrun() {
    let mut json_chunk = chunk(GLB_CHUNK_JSON, &padded_json());
    // Claim far more payload than the file holds.
    json_chunk[0..4].copy_from_slice(&4096u32.to_le_bytes());
    let glb = glb_from_chunks(&[json_chunk]);
    assert!(matches!(
        GlbContainer::parse(&glb),
        Err(FormatError::ChunkOverrun { offset: 12, length: 4096, .. })
    ));
}

#[test]
fn test_truncated_chunk_header() {
    let glb = glb_from_chunks(&[chunk(GLB_CHUNK_JSON, &padded_json()), vec![0u8; 4]]);
    assert!(matches!(
        GlbContainer::parse(&glb),
        Err(FormatError::TruncatedChunkHeader { .. })
    ));
}

#[test]
fn test_duplicate_json_chunk() {
    let json = chunk(GLB_CHUNK_JSON, &padded_json());
    let glb = glb_from_chunks(&[json.clone(), json]);
    assert!(matches!(
        GlbContainer::parse(&glb),
        Err(FormatError::DuplicateJsonChunk)
    ));
}

#[test]
fn test_duplicate_bin_chunk() {
    let glb = glb_from_chunks(&[
        chunk(GLB_CHUNK_JSON, &padded_json()),
        chunk(GLB_CHUNK_BIN, &[0u8; 8]),
        chunk(GLB_CHUNK_BIN, &[0u8; 8]),
    ]);
    assert!(matches!(
        GlbContainer::parse(&glb),
        Err(FormatError::DuplicateBinChunk)
    ));
}

#[test]
fn test_missing_json_chunk() {
    let glb = glb_from_chunks(&[chunk(GLB_CHUNK_BIN, &[0u8; 8])]);
    assert!(matches!(
        GlbContainer::parse(&glb),
        Err(FormatError::MissingJsonChunk)
    ));
}

#[test]
fn test_unknown_chunk_is_skipped() {
    let glb = glb_from_chunks(&[
        chunk(GLB_CHUNK_JSON, &padded_json()),
        chunk(0x5458_4554, b"EXTRA..."),
        chunk(GLB_CHUNK_BIN, &[7u8; 8]),
    ]);
    let container = GlbContainer::parse(&glb).unwrap();
    assert_eq!(container.chunks().len(), 3);
    assert_eq!(container.chunks()[1].kind, ChunkKind::Unknown(0x5458_4554));
    assert_eq!(container.bin_chunk(), Some(&[7u8; 8][..]));
}

#[test]
fn test_unaligned_chunk_is_followed_at_next_boundary() {
    // A 5-byte BIN payload followed by 3 padding bytes, then an unknown chunk.
    let mut bin = chunk(GLB_CHUNK_BIN, &[1, 2, 3, 4, 5]);
    bin.extend_from_slice(&[0, 0, 0]);
    let glb = glb_from_chunks(&[chunk(GLB_CHUNK_JSON, &padded_json()), bin, chunk(0x1234, &[])]);
    let container = GlbContainer::parse(&glb).unwrap();
    assert_eq!(container.bin_chunk(), Some(&[1u8, 2, 3, 4, 5][..]));
    assert_eq!(container.chunks().len(), 3);
}

#[test]
fn test_invalid_json() {
    let glb = glb_from_chunks(&[chunk(GLB_CHUNK_JSON, b"{not")]);
    assert!(matches!(GlbContainer::parse(&glb), Err(FormatError::Json(_))));
}

#[test]
fn test_schema_mismatch_is_a_format_error() {
    let json = br#"{"asset":{"version":"2.0"},"accessors":[{"componentType":5126,"count":"4","type":"VEC3"}]}"#;
    let err = GlbContainer::parse(&glb_from_chunks(&[chunk(GLB_CHUNK_JSON, json)])).unwrap_err();
    assert!(matches!(err, FormatError::Json(_)));
    assert!(err.to_string().contains("invalid type"));
}

#[test]
fn test_json_without_bin() {
    let glb = glb_from_chunks(&[chunk(GLB_CHUNK_JSON, &padded_json())]);
    let (doc, bin) = GlbContainer::parse(&glb).unwrap().into_parts();
    assert!(bin.is_none());
    assert_eq!(doc.buffers.len(), 1);
}
