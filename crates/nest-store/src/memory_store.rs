//! In-memory chunk storage backend.

use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;
use nest_types::{ChunkAddress, ChunkRecord, Transform};
use tracing::debug;

use crate::error::StoreError;
use crate::traits::{ChunkStore, PutOutcome};
use crate::transform;

/// In-memory chunk store backed by a `RwLock<HashMap>`.
///
/// Used by tests and by memory-only deployments. The write lock is the
/// per-address arbitration: concurrent writers of the same address resolve
/// to whoever inserts first, everyone else observes `AlreadyPresent`.
#[derive(Default)]
pub struct MemoryChunkStore {
    chunks: RwLock<HashMap<ChunkAddress, (ChunkRecord, Bytes)>>,
}

impl MemoryChunkStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct chunks currently stored.
    pub fn len(&self) -> usize {
        self.chunks.read().expect("lock poisoned").len()
    }

    /// Whether the store holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ChunkStore for MemoryChunkStore {
    async fn put(&self, address: ChunkAddress, data: Bytes) -> Result<PutOutcome, StoreError> {
        let mut map = self.chunks.write().expect("lock poisoned");
        if map.contains_key(&address) {
            debug!(%address, "chunk already present, deduplicated");
            return Ok(PutOutcome::AlreadyPresent);
        }

        let stored = transform::apply(Transform::Identity, data);
        let record = ChunkRecord {
            address,
            stored_size: stored.len() as u32,
            transform: Transform::Identity,
        };
        map.insert(address, (record, stored));
        Ok(PutOutcome::Stored)
    }

    async fn get(&self, address: ChunkAddress) -> Result<Option<Bytes>, StoreError> {
        let map = self.chunks.read().expect("lock poisoned");
        match map.get(&address) {
            Some((record, stored)) => {
                let raw = transform::invert(record.transform, stored.clone());
                let actual = ChunkAddress::from_data(&raw);
                if actual != address {
                    return Err(StoreError::CorruptChunk {
                        expected: address,
                        actual,
                    });
                }
                Ok(Some(raw))
            }
            None => Ok(None),
        }
    }

    async fn exists(&self, address: ChunkAddress) -> Result<bool, StoreError> {
        let map = self.chunks.read().expect("lock poisoned");
        Ok(map.contains_key(&address))
    }

    async fn record(&self, address: ChunkAddress) -> Result<Option<ChunkRecord>, StoreError> {
        let map = self.chunks.read().expect("lock poisoned");
        Ok(map.get(&address).map(|(record, _)| *record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = MemoryChunkStore::new();
        let data = Bytes::from_static(b"hello memory chunk");
        let address = ChunkAddress::from_data(&data);

        assert_eq!(
            store.put(address, data.clone()).await.unwrap(),
            PutOutcome::Stored
        );
        assert_eq!(store.get(address).await.unwrap(), Some(data));
    }

    #[tokio::test]
    async fn test_put_twice_deduplicates() {
        let store = MemoryChunkStore::new();
        let data = Bytes::from_static(b"twice");
        let address = ChunkAddress::from_data(&data);

        store.put(address, data.clone()).await.unwrap();
        assert_eq!(
            store.put(address, data).await.unwrap(),
            PutOutcome::AlreadyPresent
        );
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_get_nonexistent_returns_none() {
        let store = MemoryChunkStore::new();
        let address = ChunkAddress::from_data(b"missing");
        assert_eq!(store.get(address).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_exists_and_record() {
        let store = MemoryChunkStore::new();
        let data = Bytes::from_static(b"tracked");
        let address = ChunkAddress::from_data(&data);

        assert!(!store.exists(address).await.unwrap());
        store.put(address, data.clone()).await.unwrap();
        assert!(store.exists(address).await.unwrap());

        let record = store.record(address).await.unwrap().unwrap();
        assert_eq!(record.stored_size, data.len() as u32);
        assert_eq!(record.transform, Transform::Identity);
    }
}
