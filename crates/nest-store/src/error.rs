//! Error types for chunk storage.

use nest_types::ChunkAddress;

/// Errors that can occur during chunk store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O error occurred reading or writing a blob.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A blob's raw bytes no longer hash to its address.
    #[error("corrupt chunk: expected {expected}, got {actual}")]
    CorruptChunk {
        /// Address the blob was stored under.
        expected: ChunkAddress,
        /// Address recomputed from the bytes on disk.
        actual: ChunkAddress,
    },

    /// A blob exists but its transform record is missing, so the stored
    /// representation cannot be inverted.
    #[error("missing transform record for chunk {0}")]
    RecordMissing(ChunkAddress),

    /// Encoding or decoding a transform record failed.
    #[error("record serialization error: {0}")]
    Record(String),
}
