//! Storage backend selection.

use std::sync::Arc;

use nest_store::{ChunkStore, FileChunkStore, MemoryChunkStore};
use nest_tenant::TenantContainer;

use crate::error::PipelineError;

/// Which chunk store the pipeline writes to.
///
/// Selected once at construction; the pipeline never switches backends at
/// runtime.
#[derive(Clone)]
pub enum StoreBackend {
    /// One blob file per chunk under the tenant's `chunks/` directory.
    File,
    /// A single store shared by every tenant, so deduplication is global.
    /// [`StoreBackend::memory`] backs it with an in-memory map; nothing
    /// survives a restart.
    Memory(Arc<dyn ChunkStore>),
}

impl StoreBackend {
    /// Shared in-memory backend.
    pub fn memory() -> Self {
        Self::Memory(Arc::new(MemoryChunkStore::new()))
    }

    /// Open the chunk store serving a tenant.
    ///
    /// For the file backend this resolves the tenant's chunk directory and
    /// refuses to proceed if it falls outside the tenant root.
    pub(crate) fn open(
        &self,
        container: &TenantContainer,
        tenant_id: &str,
    ) -> Result<Arc<dyn ChunkStore>, PipelineError> {
        match self {
            StoreBackend::File => {
                container.ensure_root(tenant_id)?;
                let chunk_dir = container.chunk_dir_for(tenant_id);
                if !container.contains(&chunk_dir, tenant_id) {
                    return Err(PipelineError::PathTraversalDenied);
                }
                Ok(Arc::new(FileChunkStore::new(&chunk_dir)?))
            }
            StoreBackend::Memory(store) => Ok(store.clone()),
        }
    }
}
