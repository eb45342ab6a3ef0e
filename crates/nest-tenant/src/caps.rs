//! Filesystem capability traits.
//!
//! The container needs two host facilities: measuring how much data a
//! directory tree holds and restricting who can read a tenant root. Both
//! are expressed as traits so deployments can substitute platform-specific
//! or test implementations, and neither ever shells out to external tools.

use std::path::Path;

use crate::error::TenantError;

/// Measures the total size in bytes of a directory tree.
pub trait DiskUsageProvider: Send + Sync {
    fn usage_bytes(&self, root: &Path) -> Result<u64, TenantError>;
}

/// Restricts access to a freshly created tenant root.
pub trait PermissionSetter: Send + Sync {
    fn restrict(&self, root: &Path) -> Result<(), TenantError>;
}

/// Disk usage via a recursive metadata walk.
///
/// Counts file lengths, not allocated blocks, matching what the quota
/// tracker reserves on ingest. Symlinks are not followed.
#[derive(Debug, Default, Clone, Copy)]
pub struct WalkDiskUsage;

impl DiskUsageProvider for WalkDiskUsage {
    fn usage_bytes(&self, root: &Path) -> Result<u64, TenantError> {
        fn walk(dir: &Path) -> Result<u64, TenantError> {
            let mut total = 0u64;
            for entry in std::fs::read_dir(dir)? {
                let entry = entry?;
                let meta = entry.metadata()?;
                if meta.is_dir() {
                    total += walk(&entry.path())?;
                } else if meta.is_file() {
                    total += meta.len();
                }
            }
            Ok(total)
        }

        if !root.exists() {
            return Ok(0);
        }
        walk(root)
    }
}

/// Owner-only permissions (0700) on Unix; no-op elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct OwnerOnlyPermissions;

impl PermissionSetter for OwnerOnlyPermissions {
    #[cfg(unix)]
    fn restrict(&self, root: &Path) -> Result<(), TenantError> {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(root, std::fs::Permissions::from_mode(0o700))?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn restrict(&self, _root: &Path) -> Result<(), TenantError> {
        Ok(())
    }
}

/// Leaves permissions untouched. Used by shared-mode deployments and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPermissions;

impl PermissionSetter for NoopPermissions {
    fn restrict(&self, _root: &Path) -> Result<(), TenantError> {
        Ok(())
    }
}
