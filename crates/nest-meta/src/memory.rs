//! In-memory manifest repository for tests and memory-mode deployments.

use std::collections::BTreeMap;
use std::sync::RwLock;

use nest_types::{FileId, FileManifest, MANIFEST_VERSION};

use crate::repo::ManifestRepository;
use crate::MetaError;

/// Volatile [`ManifestRepository`] backed by a `RwLock<BTreeMap>`.
#[derive(Default)]
pub struct MemoryManifestRepository {
    manifests: RwLock<BTreeMap<FileId, FileManifest>>,
}

impl MemoryManifestRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ManifestRepository for MemoryManifestRepository {
    fn insert(&self, manifest: &FileManifest) -> Result<(), MetaError> {
        self.manifests
            .write()
            .expect("lock poisoned")
            .insert(manifest.file_id, manifest.clone());
        Ok(())
    }

    fn find_by_id(&self, id: &FileId) -> Result<Option<FileManifest>, MetaError> {
        let manifests = self.manifests.read().expect("lock poisoned");
        match manifests.get(id) {
            Some(manifest) if manifest.version != MANIFEST_VERSION => {
                Err(MetaError::UnsupportedVersion {
                    found: manifest.version,
                    supported: MANIFEST_VERSION,
                })
            }
            Some(manifest) => Ok(Some(manifest.clone())),
            None => Ok(None),
        }
    }

    fn list_by_tenant(&self, tenant_id: &str) -> Result<Vec<FileManifest>, MetaError> {
        let manifests = self.manifests.read().expect("lock poisoned");
        Ok(manifests
            .values()
            .filter(|m| m.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    fn delete(&self, id: &FileId) -> Result<bool, MetaError> {
        Ok(self
            .manifests
            .write()
            .expect("lock poisoned")
            .remove(id)
            .is_some())
    }

    fn manifest_count(&self) -> Result<usize, MetaError> {
        Ok(self.manifests.read().expect("lock poisoned").len())
    }
}
