//! Error types for tenant container management.

use std::path::PathBuf;

/// Errors that can occur managing tenant storage roots.
#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    /// An I/O error occurred creating or inspecting a tenant root.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A candidate path escaped its tenant root. The caller must deny the
    /// operation, never correct the path.
    #[error("path escapes tenant root: {0}")]
    PathTraversalDenied(PathBuf),

    /// The tenant identifier was empty.
    #[error("empty tenant id")]
    EmptyTenantId,
}
