//! Manifest building.
//!
//! A [`FileManifest`] records everything needed to reconstruct one uploaded
//! file: the ordered chunk addresses, their sizes, and the file-level
//! metadata. Manifests are created once at upload completion and never
//! edited in place.

use nest_types::{ChunkRef, FileId, FileManifest, MANIFEST_VERSION};

use crate::chunker::Chunk;
use crate::error::CasError;

/// Build a [`FileManifest`] from the chunks of one upload.
///
/// Assigns a fresh [`FileId`] and stamps the current time. The stated
/// `total_size` must equal the sum of the chunk sizes; a mismatch means the
/// chunker and the caller disagree about the buffer and is reported as
/// [`CasError::SizeInvariant`].
pub fn build_manifest(
    tenant_id: &str,
    display_name: &str,
    logical_path: &str,
    chunks: &[Chunk],
    total_size: u64,
) -> Result<FileManifest, CasError> {
    build_manifest_with_timestamp(
        tenant_id,
        display_name,
        logical_path,
        chunks,
        total_size,
        now_secs(),
    )
}

/// Build a manifest with an explicit timestamp (for deterministic testing).
pub fn build_manifest_with_timestamp(
    tenant_id: &str,
    display_name: &str,
    logical_path: &str,
    chunks: &[Chunk],
    total_size: u64,
    created_at: u64,
) -> Result<FileManifest, CasError> {
    let actual: u64 = chunks.iter().map(|c| c.data.len() as u64).sum();
    if actual != total_size {
        return Err(CasError::SizeInvariant {
            expected: total_size,
            actual,
        });
    }

    let refs = chunks
        .iter()
        .enumerate()
        .map(|(index, chunk)| ChunkRef {
            address: chunk.address,
            size: chunk.size(),
            index: index as u32,
        })
        .collect();

    Ok(FileManifest {
        version: MANIFEST_VERSION,
        file_id: FileId::new(),
        tenant_id: tenant_id.to_string(),
        display_name: display_name.to_string(),
        logical_path: logical_path.to_string(),
        total_size,
        created_at,
        updated_at: created_at,
        chunks: refs,
    })
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
