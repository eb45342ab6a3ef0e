//! File manifest persistence wrapping Fjall.
//!
//! [`ManifestRepository`] is the storage interface for
//! [`FileManifest`](nest_types::FileManifest) records:
//!
//! - `manifests` — [`FileId`](nest_types::FileId) → serialized manifest
//! - `tenants` — `tenant/file_id` → file id, the per-tenant listing index
//!
//! Stored manifests carry a format version; reads reject versions this
//! build does not understand rather than guessing at field layouts.
//! Deleting here removes the record only — chunk blobs are shared between
//! manifests and are never reclaimed by this layer.

mod error;
mod memory;
mod repo;

pub use error::MetaError;
pub use memory::MemoryManifestRepository;
pub use repo::{FjallManifestRepository, ManifestRepository};
