//! Core trait and types for chunk storage.

use bytes::Bytes;
use nest_types::{ChunkAddress, ChunkRecord};

use crate::error::StoreError;

/// Result of a chunk write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The chunk was written by this call.
    Stored,
    /// A chunk with this address already existed. Content-addressing
    /// guarantees the stored bytes are identical, so this is a success —
    /// the deduplication hit the caller was hoping for.
    AlreadyPresent,
}

/// Trait for storing and retrieving content-addressed chunks.
///
/// Implementations must tolerate concurrent writers racing on the same
/// address: the race resolves to one logical winner and every writer
/// observes success. All implementations are `Send + Sync` for use across
/// async tasks; payloads are [`Bytes`] to keep the pipeline zero-copy.
#[async_trait::async_trait]
pub trait ChunkStore: Send + Sync {
    /// Store a chunk under its address if it is not already present.
    ///
    /// `data` is the raw chunk; the store applies its configured transform
    /// before persisting and records it so reads can invert it.
    async fn put(&self, address: ChunkAddress, data: Bytes) -> Result<PutOutcome, StoreError>;

    /// Retrieve the raw bytes of a chunk, inverting the recorded transform.
    /// Returns `None` if the address is not stored.
    async fn get(&self, address: ChunkAddress) -> Result<Option<Bytes>, StoreError>;

    /// Check whether a chunk exists.
    async fn exists(&self, address: ChunkAddress) -> Result<bool, StoreError>;

    /// Retrieve the stored record for a chunk, if present.
    async fn record(&self, address: ChunkAddress) -> Result<Option<ChunkRecord>, StoreError>;
}
