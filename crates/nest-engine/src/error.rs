//! Error types for the upload and reconstruction pipeline.

use nest_types::ChunkAddress;

/// Errors surfaced by [`UploadPipeline`](crate::UploadPipeline) and
/// [`Reconstructor`](crate::Reconstructor).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A required input was missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// The tenant's storage quota cannot cover this upload.
    #[error("quota exceeded for tenant {tenant}: requested {requested} bytes")]
    QuotaExceeded {
        /// Tenant whose reservation was denied.
        tenant: String,
        /// Bytes the upload asked for.
        requested: u64,
    },

    /// Writing a chunk failed. A chunk that already existed is not a
    /// failure; this is real I/O trouble and the ingestion is aborted.
    #[error("chunk write failed: {0}")]
    ChunkWrite(#[source] nest_store::StoreError),

    /// A chunk referenced by a manifest is not in the store.
    #[error("chunk missing: {0}")]
    ChunkMissing(ChunkAddress),

    /// A storage path escaped the tenant's root. Always a denial.
    #[error("path escapes tenant root")]
    PathTraversalDenied,

    /// The reconstructed bytes do not add up to the manifest's size.
    /// The result is never truncated or padded to fit.
    #[error("reconstructed size mismatch: expected {expected}, got {actual}")]
    ManifestSizeMismatch {
        /// Size recorded in the manifest.
        expected: u64,
        /// Size actually reassembled.
        actual: u64,
    },

    /// Chunk store error outside the write path (read, open, corruption).
    #[error("store error: {0}")]
    Store(#[from] nest_store::StoreError),

    /// Manifest construction error.
    #[error("cas error: {0}")]
    Cas(#[from] nest_cas::CasError),

    /// Metadata repository error.
    #[error("metadata error: {0}")]
    Meta(#[from] nest_meta::MetaError),

    /// Tenant container error.
    #[error("tenant error: {0}")]
    Tenant(#[from] nest_tenant::TenantError),
}
