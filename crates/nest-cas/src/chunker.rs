//! Splitting a buffer into content-addressed chunks.

use bytes::Bytes;
use nest_types::ChunkAddress;

use crate::boundary::find_boundaries;

/// A single chunk of data with its content address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Content address: `sha256(data)`.
    pub address: ChunkAddress,
    /// Byte offset within the original buffer.
    pub offset: u64,
    /// The raw chunk data.
    pub data: Bytes,
}

impl Chunk {
    /// Size of the chunk in bytes.
    pub fn size(&self) -> u32 {
        self.data.len() as u32
    }
}

/// Split a buffer into content-defined chunks.
///
/// Each chunk's address is the SHA-256 of its raw bytes, computed before
/// any storage transform — the address is the dedup key and must stay
/// transform-independent. Returns an empty vec for empty input.
pub fn split(buffer: &[u8]) -> Vec<Chunk> {
    if buffer.is_empty() {
        return Vec::new();
    }

    find_boundaries(buffer)
        .into_iter()
        .map(|range| {
            let offset = range.start as u64;
            let data = &buffer[range];
            Chunk {
                address: ChunkAddress::from_data(data),
                offset,
                data: Bytes::copy_from_slice(data),
            }
        })
        .collect()
}
