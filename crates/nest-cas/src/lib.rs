//! Content-defined chunking, content addressing, and manifest building.
//!
//! This crate provides:
//! - [`find_boundaries`] — splits a buffer into content-defined ranges using
//!   a rolling-hash boundary test.
//! - [`split`] — produces [`Chunk`]s, each identified by the SHA-256 of its
//!   raw bytes.
//! - [`build_manifest`] — assembles the ordered chunk list plus file
//!   metadata into a [`FileManifest`](nest_types::FileManifest).
//!
//! The chunking parameters are a fixed deployment-wide policy: changing any
//! of them silently breaks deduplication against previously stored data.

mod boundary;
mod chunker;
mod error;
mod manifest;

pub use boundary::{find_boundaries, BOUNDARY_MASK, MAX_CHUNK, MIN_CHUNK, WINDOW_SIZE};
pub use chunker::{split, Chunk};
pub use error::CasError;
pub use manifest::{build_manifest, build_manifest_with_timestamp};
