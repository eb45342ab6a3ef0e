//! [`Reconstructor`] — the read path from manifest back to file bytes.

use std::sync::Arc;

use nest_tenant::TenantContainer;
use nest_types::FileManifest;
use tracing::debug;

use crate::backend::StoreBackend;
use crate::error::PipelineError;

/// Reassembles a file from its manifest's chunk list.
pub struct Reconstructor {
    container: Arc<TenantContainer>,
    backend: StoreBackend,
}

impl Reconstructor {
    /// Create a reconstructor over the same container and backend the
    /// pipeline writes through.
    pub fn new(container: Arc<TenantContainer>, backend: StoreBackend) -> Self {
        Self { container, backend }
    }

    /// Fetch every chunk in index order and concatenate them.
    ///
    /// The result must be byte-identical to the originally uploaded
    /// buffer; a length that disagrees with the manifest is an error, not
    /// something to truncate or pad away.
    pub async fn reconstruct(&self, manifest: &FileManifest) -> Result<Vec<u8>, PipelineError> {
        let store = self.backend.open(&self.container, &manifest.tenant_id)?;

        let mut result = Vec::with_capacity(manifest.total_size as usize);
        for chunk_ref in &manifest.chunks {
            let data = store
                .get(chunk_ref.address)
                .await?
                .ok_or(PipelineError::ChunkMissing(chunk_ref.address))?;
            result.extend_from_slice(&data);
        }

        let actual = result.len() as u64;
        if actual != manifest.total_size {
            return Err(PipelineError::ManifestSizeMismatch {
                expected: manifest.total_size,
                actual,
            });
        }

        debug!(
            file_id = %manifest.file_id,
            chunks = manifest.chunk_count(),
            total_size = actual,
            "reconstructed file"
        );
        Ok(result)
    }
}
