//! Error types for chunking and manifest building.

/// Errors that can occur while building a manifest.
#[derive(Debug, thiserror::Error)]
pub enum CasError {
    /// The chunk sizes do not add up to the stated total. This is an
    /// internal invariant violation (a bug in the caller's chunking), not
    /// bad user input.
    #[error("size invariant violated: chunks sum to {actual}, expected {expected}")]
    SizeInvariant {
        /// Total the caller claimed.
        expected: u64,
        /// Sum of the chunk sizes.
        actual: u64,
    },
}
