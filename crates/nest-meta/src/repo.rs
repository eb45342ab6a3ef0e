//! [`ManifestRepository`] trait and its Fjall-backed implementation.

use std::path::Path;

use fjall::{Database, Keyspace, KeyspaceCreateOptions};
use nest_types::{FileId, FileManifest, MANIFEST_VERSION};
use tracing::debug;

use crate::MetaError;

type Result<T> = std::result::Result<T, MetaError>;

/// Persistence interface for file manifests.
///
/// Deleting a manifest removes the record only. Chunk blobs are never
/// reclaimed here; they are content-addressed and may be referenced by
/// other manifests.
pub trait ManifestRepository: Send + Sync {
    /// Store a manifest, keyed by its `file_id`.
    fn insert(&self, manifest: &FileManifest) -> Result<()>;

    /// Retrieve a manifest by id.
    fn find_by_id(&self, id: &FileId) -> Result<Option<FileManifest>>;

    /// List all manifests belonging to a tenant, ordered by file id.
    fn list_by_tenant(&self, tenant_id: &str) -> Result<Vec<FileManifest>>;

    /// Delete a manifest record. Returns `false` if no such manifest.
    fn delete(&self, id: &FileId) -> Result<bool>;

    /// Total number of stored manifests. O(n) scan.
    fn manifest_count(&self) -> Result<usize>;
}

/// Manifest repository backed by Fjall.
pub struct FjallManifestRepository {
    /// The underlying Fjall database handle.
    #[allow(dead_code)]
    db: Database,
    /// FileId (16 bytes) → serialized FileManifest.
    manifests: Keyspace,
    /// `tenant/file_id` → FileId (16 bytes); the per-tenant index.
    tenants: Keyspace,
}

impl FjallManifestRepository {
    /// Open a persistent repository at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::builder(path).open()?;
        Self::init_keyspaces(db)
    }

    /// Open a temporary repository that is cleaned up on drop.
    ///
    /// Useful for tests.
    pub fn open_temporary() -> Result<Self> {
        let tmp = tempfile::tempdir().map_err(std::io::Error::other)?;
        let db = Database::builder(tmp.path()).temporary(true).open()?;
        Self::init_keyspaces(db)
    }

    fn init_keyspaces(db: Database) -> Result<Self> {
        let manifests = db.keyspace("manifests", KeyspaceCreateOptions::default)?;
        let tenants = db.keyspace("tenants", KeyspaceCreateOptions::default)?;
        Ok(Self {
            db,
            manifests,
            tenants,
        })
    }
}

impl ManifestRepository for FjallManifestRepository {
    fn insert(&self, manifest: &FileManifest) -> Result<()> {
        let value = postcard::to_allocvec(manifest)?;
        self.manifests
            .insert(manifest.file_id.as_bytes(), value.as_slice())?;
        self.tenants.insert(
            tenant_index_key(&manifest.tenant_id, &manifest.file_id).as_bytes(),
            manifest.file_id.as_bytes(),
        )?;
        debug!(file_id = %manifest.file_id, tenant = %manifest.tenant_id, "stored manifest");
        Ok(())
    }

    fn find_by_id(&self, id: &FileId) -> Result<Option<FileManifest>> {
        match self.manifests.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(decode_manifest(&bytes)?)),
            None => Ok(None),
        }
    }

    fn list_by_tenant(&self, tenant_id: &str) -> Result<Vec<FileManifest>> {
        let prefix = format!("{tenant_id}/");
        let mut manifests = Vec::new();
        for guard in self.tenants.prefix(prefix.as_bytes()) {
            let v = guard.value()?;
            if let Some(bytes) = self.manifests.get(v.as_ref())? {
                manifests.push(decode_manifest(&bytes)?);
            }
        }
        Ok(manifests)
    }

    fn delete(&self, id: &FileId) -> Result<bool> {
        let Some(manifest) = self.find_by_id(id)? else {
            return Ok(false);
        };
        self.tenants
            .remove(tenant_index_key(&manifest.tenant_id, id).as_bytes())?;
        self.manifests.remove(id.as_bytes())?;
        debug!(file_id = %id, "deleted manifest record");
        Ok(true)
    }

    fn manifest_count(&self) -> Result<usize> {
        let mut count = 0;
        for guard in self.manifests.iter() {
            let _ = guard.key()?;
            count += 1;
        }
        Ok(count)
    }
}

/// Decode a stored manifest, rejecting versions this build cannot read.
fn decode_manifest(bytes: &[u8]) -> Result<FileManifest> {
    let manifest: FileManifest = postcard::from_bytes(bytes)?;
    if manifest.version != MANIFEST_VERSION {
        return Err(MetaError::UnsupportedVersion {
            found: manifest.version,
            supported: MANIFEST_VERSION,
        });
    }
    Ok(manifest)
}

/// Build the tenant index key: `"tenant_id/file_id"`.
///
/// File ids render as fixed-width hyphenated UUIDs, so a tenant's entries
/// form one contiguous prefix range.
fn tenant_index_key(tenant_id: &str, file_id: &FileId) -> String {
    format!("{tenant_id}/{file_id}")
}
