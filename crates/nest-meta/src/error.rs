//! Error types for manifest persistence.

/// Errors returned by [`ManifestRepository`](crate::ManifestRepository)
/// operations.
#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    /// Fjall database error.
    #[error("fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    /// I/O error (e.g. from Fjall guard operations).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] postcard::Error),

    /// A stored manifest carries a version this build does not understand.
    #[error("unsupported manifest version {found} (supported: {supported})")]
    UnsupportedVersion {
        /// Version found in the stored record.
        found: u8,
        /// Version this build reads and writes.
        supported: u8,
    },
}
