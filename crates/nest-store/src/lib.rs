//! Content-addressed chunk storage.
//!
//! A [`ChunkStore`] maps a [`ChunkAddress`](nest_types::ChunkAddress) to a
//! write-once blob with create-if-absent semantics: writing an address that
//! already exists is the deduplication success path, not an error. Two
//! backends are provided:
//!
//! - [`FileChunkStore`] — one blob file per chunk plus a transform record,
//!   with atomic temp-file-then-rename writes.
//! - [`MemoryChunkStore`] — volatile, for tests and memory-only deployments.
//!
//! No backend defines deletion: chunks are write-once, read-many, and
//! reclamation of unreferenced chunks is out of scope for this layer.

mod error;
mod file_store;
mod memory_store;
mod traits;
mod transform;

pub use error::StoreError;
pub use file_store::FileChunkStore;
pub use memory_store::MemoryChunkStore;
pub use traits::{ChunkStore, PutOutcome};
