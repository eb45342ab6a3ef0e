//! Shared test utilities for nest-engine tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use nest_meta::MemoryManifestRepository;
use nest_store::{ChunkStore, MemoryChunkStore, PutOutcome, StoreError};
use nest_tenant::{IsolationMode, NoopPermissions, QuotaTracker, TenantContainer};
use nest_types::{ChunkAddress, ChunkRecord};
use tempfile::TempDir;

use crate::{Reconstructor, StoreBackend, UploadPipeline};

/// Generate deterministic, non-repeating test data.
pub fn test_data(size: usize) -> Vec<u8> {
    test_data_seeded(size, 0xDEAD_BEEF)
}

/// Seeded variant so tests can produce distinct buffers.
pub fn test_data_seeded(size: usize, seed: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state: u32 = seed;
    for _ in 0..size {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 16) as u8);
    }
    data
}

/// Pipeline and reconstructor over a shared in-memory chunk store.
pub struct MemRig {
    pub pipeline: UploadPipeline,
    pub reconstructor: Reconstructor,
    pub repo: Arc<MemoryManifestRepository>,
    pub store: Arc<MemoryChunkStore>,
}

pub fn mem_rig() -> MemRig {
    mem_rig_inner(None)
}

pub fn mem_rig_with_quota(limit_bytes: u64) -> (MemRig, Arc<QuotaTracker>) {
    let quota = Arc::new(QuotaTracker::new(limit_bytes));
    let rig = mem_rig_inner(Some(quota.clone()));
    (rig, quota)
}

fn mem_rig_inner(quota: Option<Arc<QuotaTracker>>) -> MemRig {
    // The memory backend never touches the filesystem, so the container
    // base is irrelevant.
    let container = Arc::new(TenantContainer::new(
        "/unused",
        IsolationMode::Isolated,
        Box::new(NoopPermissions),
    ));
    let repo = Arc::new(MemoryManifestRepository::new());
    let store = Arc::new(MemoryChunkStore::new());
    let backend = StoreBackend::Memory(store.clone());

    let mut pipeline = UploadPipeline::new(container.clone(), repo.clone(), backend.clone());
    if let Some(quota) = quota {
        pipeline = pipeline.with_quota(quota);
    }

    MemRig {
        pipeline,
        reconstructor: Reconstructor::new(container, backend),
        repo,
        store,
    }
}

/// Pipeline and reconstructor over per-tenant on-disk chunk stores.
pub struct FileRig {
    pub pipeline: UploadPipeline,
    pub reconstructor: Reconstructor,
    pub repo: Arc<MemoryManifestRepository>,
    pub base: TempDir,
}

pub fn file_rig(mode: IsolationMode) -> FileRig {
    let base = TempDir::new().unwrap();
    let container = Arc::new(TenantContainer::new(
        base.path(),
        mode,
        Box::new(NoopPermissions),
    ));
    let repo = Arc::new(MemoryManifestRepository::new());
    let backend = StoreBackend::File;

    FileRig {
        pipeline: UploadPipeline::new(container.clone(), repo.clone(), backend.clone()),
        reconstructor: Reconstructor::new(container, backend),
        repo,
        base,
    }
}

/// A [`ChunkStore`] wrapper that starts failing writes after a set number
/// of successful puts.
///
/// Reads pass through untouched. Used to exercise mid-upload I/O failure:
/// an ingestion that dies on chunk N must leave no manifest behind and
/// give back its quota reservation.
pub struct FailingChunkStore {
    inner: Arc<dyn ChunkStore>,
    puts_remaining: AtomicUsize,
}

impl FailingChunkStore {
    /// Allow `puts_before_failure` successful puts, then fail every write.
    pub fn new(inner: Arc<dyn ChunkStore>, puts_before_failure: usize) -> Self {
        Self {
            inner,
            puts_remaining: AtomicUsize::new(puts_before_failure),
        }
    }
}

#[async_trait::async_trait]
impl ChunkStore for FailingChunkStore {
    async fn put(&self, address: ChunkAddress, data: Bytes) -> Result<PutOutcome, StoreError> {
        let granted = self
            .puts_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !granted {
            return Err(StoreError::Io(std::io::Error::other(
                "injected write failure",
            )));
        }
        self.inner.put(address, data).await
    }

    async fn get(&self, address: ChunkAddress) -> Result<Option<Bytes>, StoreError> {
        self.inner.get(address).await
    }

    async fn exists(&self, address: ChunkAddress) -> Result<bool, StoreError> {
        self.inner.exists(address).await
    }

    async fn record(&self, address: ChunkAddress) -> Result<Option<ChunkRecord>, StoreError> {
        self.inner.record(address).await
    }
}

/// Count chunk blobs (not transform records) in a directory.
pub fn blob_count(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .filter(|name| !name.ends_with(".rec"))
        .count()
}
