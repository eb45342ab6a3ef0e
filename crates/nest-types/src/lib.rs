//! Shared types and identifiers for Nest.
//!
//! This crate defines the core types used across the Nest workspace:
//! the content address ([`ChunkAddress`]), the opaque file identifier
//! ([`FileId`]), the persisted manifest ([`FileManifest`], [`ChunkRef`]),
//! and the per-chunk storage record ([`ChunkRecord`], [`Transform`]).

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Current manifest format version.
///
/// Bumped on incompatible changes to [`FileManifest`]; the metadata
/// repository rejects unknown versions on read.
pub const MANIFEST_VERSION: u8 = 1;

// ---------------------------------------------------------------------------
// Content address
// ---------------------------------------------------------------------------

/// Content address of a chunk: `sha256(raw_chunk_bytes)`.
///
/// The address is always computed over the raw, pre-transform bytes, so
/// chunks with identical content share one address regardless of how they
/// were stored. Its lowercase-hex form is the on-disk blob file name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ChunkAddress([u8; 32]);

impl ChunkAddress {
    /// Compute the address of a chunk from its raw bytes.
    pub fn from_data(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Return the raw 32-byte representation.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse an address from its 64-character lowercase/uppercase hex form.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 64 {
            return None;
        }
        let raw = hex.as_bytes();
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = (hex_nibble(raw[i * 2])? << 4) | hex_nibble(raw[i * 2 + 1])?;
        }
        Some(Self(bytes))
    }
}

impl From<[u8; 32]> for ChunkAddress {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for ChunkAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for ChunkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkAddress({self})")
    }
}

fn hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// File identifier
// ---------------------------------------------------------------------------

/// Opaque identifier for an uploaded file, assigned at manifest creation.
///
/// Unlike [`ChunkAddress`], a `FileId` is not content-derived: uploading the
/// same bytes twice produces two distinct manifests with distinct ids.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct FileId(uuid::Uuid);

impl FileId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Return the raw 16-byte representation (metadata store key).
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Parse from the canonical hyphenated string form.
    pub fn parse(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// Persisted description of one uploaded file.
///
/// A manifest is created once at upload completion and is immutable
/// afterwards; re-uploading a file creates a new manifest. Concatenating the
/// referenced chunks in index order reproduces the original file exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileManifest {
    /// Manifest format version (see [`MANIFEST_VERSION`]).
    pub version: u8,
    /// Opaque identifier assigned at creation.
    pub file_id: FileId,
    /// Owning tenant (unsanitized identifier as supplied at upload).
    pub tenant_id: String,
    /// Original file name as uploaded.
    pub display_name: String,
    /// Logical destination path within the tenant's namespace.
    pub logical_path: String,
    /// Total size of the original file in bytes; always equals the sum of
    /// the chunk sizes.
    pub total_size: u64,
    /// Unix timestamp (seconds) of creation.
    pub created_at: u64,
    /// Unix timestamp (seconds) of the last update. Equal to `created_at`
    /// for as long as manifests stay immutable.
    pub updated_at: u64,
    /// Ordered chunk references; `chunks[i].index == i`.
    pub chunks: Vec<ChunkRef>,
}

impl FileManifest {
    /// Number of chunks the file was split into.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

/// Reference to one chunk within a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRef {
    /// Content address of the chunk.
    pub address: ChunkAddress,
    /// Size of the chunk in bytes.
    pub size: u32,
    /// Position within the file (0-based, contiguous).
    pub index: u32,
}

// ---------------------------------------------------------------------------
// Chunk storage record
// ---------------------------------------------------------------------------

/// Reversible transform applied to a chunk before it was written to disk.
///
/// The address is computed over the raw bytes, so the transform never
/// affects deduplication; it only changes the stored representation. Every
/// stored chunk records its transform — a blob without one cannot be
/// inverted and is treated as unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transform {
    /// Bytes stored verbatim.
    Identity,
}

/// Stored form of a chunk: what the store needs to serve a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Content address (of the raw bytes).
    pub address: ChunkAddress,
    /// Size of the on-disk representation after the transform.
    pub stored_size: u32,
    /// Transform to invert when reading.
    pub transform: Transform,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_address_deterministic() {
        let a1 = ChunkAddress::from_data(b"hello world");
        let a2 = ChunkAddress::from_data(b"hello world");
        assert_eq!(a1, a2, "same data must produce same address");
    }

    #[test]
    fn test_chunk_address_different_data_different_address() {
        let a1 = ChunkAddress::from_data(b"hello");
        let a2 = ChunkAddress::from_data(b"world");
        assert_ne!(a1, a2);
    }

    #[test]
    fn test_chunk_address_is_sha256() {
        // Known SHA-256 vector: sha256("abc").
        let addr = ChunkAddress::from_data(b"abc");
        assert_eq!(
            addr.to_string(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_chunk_address_hex_roundtrip() {
        let addr = ChunkAddress::from_data(b"roundtrip");
        let hex = addr.to_string();
        assert_eq!(hex.len(), 64);
        assert_eq!(ChunkAddress::from_hex(&hex), Some(addr));
    }

    #[test]
    fn test_chunk_address_from_hex_rejects_garbage() {
        assert!(ChunkAddress::from_hex("too short").is_none());
        assert!(ChunkAddress::from_hex(&"zz".repeat(32)).is_none());
    }

    #[test]
    fn test_chunk_address_from_hex_accepts_uppercase() {
        let addr = ChunkAddress::from_data(b"case");
        let upper = addr.to_string().to_uppercase();
        assert_eq!(ChunkAddress::from_hex(&upper), Some(addr));
    }

    #[test]
    fn test_file_id_unique() {
        let id1 = FileId::new();
        let id2 = FileId::new();
        assert_ne!(id1, id2, "fresh file ids must be distinct");
    }

    #[test]
    fn test_file_id_parse_roundtrip() {
        let id = FileId::new();
        let parsed = FileId::parse(&id.to_string());
        assert_eq!(parsed, Some(id));
    }

    #[test]
    fn test_file_id_parse_rejects_garbage() {
        assert!(FileId::parse("not-a-uuid").is_none());
    }

    #[test]
    fn test_chunk_address_postcard_roundtrip() {
        let addr = ChunkAddress::from_data(b"chunk content");
        let encoded = postcard::to_allocvec(&addr).unwrap();
        let decoded: ChunkAddress = postcard::from_bytes(&encoded).unwrap();
        assert_eq!(addr, decoded);
    }

    #[test]
    fn test_manifest_postcard_roundtrip() {
        let manifest = FileManifest {
            version: MANIFEST_VERSION,
            file_id: FileId::new(),
            tenant_id: "alice".to_string(),
            display_name: "photo.jpg".to_string(),
            logical_path: "/vacation".to_string(),
            total_size: 1524,
            created_at: 1700000000,
            updated_at: 1700000000,
            chunks: vec![
                ChunkRef {
                    address: ChunkAddress::from_data(b"chunk-0"),
                    size: 1024,
                    index: 0,
                },
                ChunkRef {
                    address: ChunkAddress::from_data(b"chunk-1"),
                    size: 500,
                    index: 1,
                },
            ],
        };

        let encoded = postcard::to_allocvec(&manifest).unwrap();
        let decoded: FileManifest = postcard::from_bytes(&encoded).unwrap();
        assert_eq!(manifest, decoded);
    }

    #[test]
    fn test_chunk_record_postcard_roundtrip() {
        let record = ChunkRecord {
            address: ChunkAddress::from_data(b"stored"),
            stored_size: 4096,
            transform: Transform::Identity,
        };
        let encoded = postcard::to_allocvec(&record).unwrap();
        let decoded: ChunkRecord = postcard::from_bytes(&encoded).unwrap();
        assert_eq!(record, decoded);
    }

    #[test]
    fn test_file_id_json_is_string() {
        // The HTTP layer serializes FileId into JSON responses.
        let id = FileId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
