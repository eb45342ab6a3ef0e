//! File-based chunk storage backend.
//!
//! Stores one blob file per chunk, named by the lowercase hex of its
//! address: `{dir}/{hex}`. This flat naming is the on-disk wire format —
//! external tools read chunks directly by hashing their content, so it must
//! not change. Next to each blob lives its transform record at
//! `{dir}/{hex}.rec` (postcard-encoded [`ChunkRecord`]).

use std::path::{Path, PathBuf};

use bytes::Bytes;
use nest_types::{ChunkAddress, ChunkRecord, Transform};
use tracing::{debug, error};

use crate::error::StoreError;
use crate::traits::{ChunkStore, PutOutcome};
use crate::transform;

/// File-based chunk store with one blob per chunk.
///
/// Writes are atomic: record and blob are each written to a uniquely named
/// temporary file first, then renamed into place, so a crash mid-write
/// never leaves a partial or zero-length blob visible to readers. The
/// record is renamed before the blob: a visible blob always has a readable
/// record.
pub struct FileChunkStore {
    dir: PathBuf,
    transform: Transform,
}

impl FileChunkStore {
    /// Create a chunk store rooted at the given directory.
    ///
    /// The directory is created if it does not exist.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            transform: Transform::Identity,
        })
    }

    /// Directory this store writes into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn chunk_path(&self, address: &ChunkAddress) -> PathBuf {
        self.dir.join(address.to_string())
    }

    fn record_path(&self, address: &ChunkAddress) -> PathBuf {
        self.dir.join(format!("{address}.rec"))
    }

    /// Write `data` to `path` atomically via a uniquely named temp file.
    ///
    /// The unique suffix keeps concurrent writers of the same address from
    /// interleaving on a shared temp file; both rename identical content
    /// into place and either order is a correct final state. On failure the
    /// temp file is removed (best effort) so transient errors do not
    /// accumulate junk in the chunk directory.
    async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StoreError> {
        let tmp = path.with_extension(format!("{:016x}.tmp", rand::random::<u64>()));
        if let Err(e) = tokio::fs::write(&tmp, data).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ChunkStore for FileChunkStore {
    async fn put(&self, address: ChunkAddress, data: Bytes) -> Result<PutOutcome, StoreError> {
        let path = self.chunk_path(&address);

        if tokio::fs::try_exists(&path).await? {
            debug!(%address, "chunk already present, deduplicated");
            return Ok(PutOutcome::AlreadyPresent);
        }

        let stored = transform::apply(self.transform, data);
        let record = ChunkRecord {
            address,
            stored_size: stored.len() as u32,
            transform: self.transform,
        };
        let record_bytes =
            postcard::to_allocvec(&record).map_err(|e| StoreError::Record(e.to_string()))?;

        // Record first, blob second: readers that see the blob are
        // guaranteed to find the record that inverts it. An orphan record
        // from a crash between the two renames is harmless and overwritten
        // on retry.
        Self::write_atomic(&self.record_path(&address), &record_bytes).await?;
        Self::write_atomic(&path, &stored).await?;

        debug!(%address, size = stored.len(), "stored chunk");
        Ok(PutOutcome::Stored)
    }

    async fn get(&self, address: ChunkAddress) -> Result<Option<Bytes>, StoreError> {
        let stored = match tokio::fs::read(self.chunk_path(&address)).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let record = self
            .record(address)
            .await?
            .ok_or(StoreError::RecordMissing(address))?;

        let raw = transform::invert(record.transform, Bytes::from(stored));

        // Verify-on-read: the raw bytes must still hash to the address.
        // A corrupt blob is an error, never silently returned.
        let actual = ChunkAddress::from_data(&raw);
        if actual != address {
            error!(expected = %address, %actual, "chunk corruption detected on read");
            return Err(StoreError::CorruptChunk {
                expected: address,
                actual,
            });
        }

        Ok(Some(raw))
    }

    async fn exists(&self, address: ChunkAddress) -> Result<bool, StoreError> {
        Ok(tokio::fs::try_exists(self.chunk_path(&address)).await?)
    }

    async fn record(&self, address: ChunkAddress) -> Result<Option<ChunkRecord>, StoreError> {
        match tokio::fs::read(self.record_path(&address)).await {
            Ok(bytes) => {
                let record =
                    postcard::from_bytes(&bytes).map_err(|e| StoreError::Record(e.to_string()))?;
                Ok(Some(record))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}
