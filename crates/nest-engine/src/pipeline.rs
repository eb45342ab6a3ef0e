//! [`UploadPipeline`] — the write path from raw buffer to stored manifest.

use std::sync::Arc;

use nest_cas::{build_manifest, split};
use nest_meta::ManifestRepository;
use nest_store::PutOutcome;
use nest_tenant::{sanitize_tenant, QuotaTracker, TenantContainer};
use nest_types::FileManifest;
use tracing::{debug, info};

use crate::backend::StoreBackend;
use crate::error::PipelineError;

/// Turns an uploaded buffer into deduplicated chunks plus a manifest.
///
/// All collaborators are injected at construction and the caller controls
/// their lifecycle; the pipeline holds no global state. One pipeline
/// instance serves all tenants concurrently — ingestions share nothing but
/// the quota tracker's per-tenant counters.
pub struct UploadPipeline {
    container: Arc<TenantContainer>,
    repo: Arc<dyn ManifestRepository>,
    backend: StoreBackend,
    quota: Option<Arc<QuotaTracker>>,
}

impl UploadPipeline {
    /// Create a pipeline with no quota enforcement.
    pub fn new(
        container: Arc<TenantContainer>,
        repo: Arc<dyn ManifestRepository>,
        backend: StoreBackend,
    ) -> Self {
        Self {
            container,
            repo,
            backend,
            quota: None,
        }
    }

    /// Enable per-tenant quota enforcement.
    pub fn with_quota(mut self, quota: Arc<QuotaTracker>) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Ingest a complete file buffer for a tenant.
    ///
    /// Either every chunk is stored and a manifest is persisted, or the
    /// ingestion fails with no manifest. Chunks written before a failure
    /// are left behind: they are content-addressed, so they are either
    /// referenced by other manifests or harmless orphans.
    ///
    /// An empty buffer is a valid upload and produces a zero-chunk
    /// manifest.
    pub async fn ingest(
        &self,
        tenant_id: &str,
        display_name: &str,
        logical_path: &str,
        buffer: &[u8],
    ) -> Result<FileManifest, PipelineError> {
        if tenant_id.is_empty() {
            return Err(PipelineError::InvalidInput("empty tenant id"));
        }
        if display_name.is_empty() {
            return Err(PipelineError::InvalidInput("empty display name"));
        }

        let total_size = buffer.len() as u64;
        info!(
            tenant = tenant_id,
            name = display_name,
            total_size,
            "ingest: starting upload"
        );

        let store = self.backend.open(&self.container, tenant_id)?;

        // Quota counters are keyed by the sanitized tenant name so they
        // line up with the on-disk directory a restart preloads from.
        let quota_key = sanitize_tenant(tenant_id);

        // Reserve quota before the first write so two concurrent uploads
        // can never both slip under the limit.
        if let Some(quota) = &self.quota {
            if !quota.reserve(&quota_key, total_size) {
                return Err(PipelineError::QuotaExceeded {
                    tenant: tenant_id.to_string(),
                    requested: total_size,
                });
            }
        }

        let result = self
            .store_and_commit(tenant_id, display_name, logical_path, buffer, &*store)
            .await;

        if result.is_err() {
            if let Some(quota) = &self.quota {
                quota.release(&quota_key, total_size);
            }
        }
        result
    }

    async fn store_and_commit(
        &self,
        tenant_id: &str,
        display_name: &str,
        logical_path: &str,
        buffer: &[u8],
        store: &dyn nest_store::ChunkStore,
    ) -> Result<FileManifest, PipelineError> {
        let chunks = split(buffer);
        debug!(num_chunks = chunks.len(), "split buffer into chunks");

        let mut deduplicated = 0usize;
        for chunk in &chunks {
            let outcome = store
                .put(chunk.address, chunk.data.clone())
                .await
                .map_err(PipelineError::ChunkWrite)?;
            if outcome == PutOutcome::AlreadyPresent {
                deduplicated += 1;
            }
        }

        let manifest = build_manifest(
            tenant_id,
            display_name,
            logical_path,
            &chunks,
            buffer.len() as u64,
        )?;
        self.repo.insert(&manifest)?;

        info!(
            tenant = tenant_id,
            file_id = %manifest.file_id,
            chunks = chunks.len(),
            deduplicated,
            "ingest: upload complete"
        );
        Ok(manifest)
    }
}
