//! Per-tenant storage roots and path containment.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::caps::PermissionSetter;
use crate::error::TenantError;

/// How tenant data is laid out under the storage base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationMode {
    /// Every tenant gets its own `tenant_<id>` root. The default.
    #[default]
    Isolated,
    /// All tenants share the base directory. No isolation guarantee is
    /// made; in exchange, deduplication is global across tenants.
    Shared,
}

/// Maps tenant identifiers to storage roots and enforces that every path
/// handed to the storage layer stays inside the tenant's root.
pub struct TenantContainer {
    base: PathBuf,
    mode: IsolationMode,
    permissions: Box<dyn PermissionSetter>,
}

impl TenantContainer {
    /// Create a container over the given storage base.
    pub fn new(
        base: impl Into<PathBuf>,
        mode: IsolationMode,
        permissions: Box<dyn PermissionSetter>,
    ) -> Self {
        Self {
            base: base.into(),
            mode,
            permissions,
        }
    }

    /// Storage base directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Isolation mode this container was built with.
    pub fn mode(&self) -> IsolationMode {
        self.mode
    }

    /// Storage root for a tenant.
    ///
    /// The identifier is sanitized before it touches a path: anything
    /// outside `[A-Za-z0-9_-]` becomes `_`, so an id like `../../etc`
    /// lands in `tenant______etc` under the base instead of escaping it.
    pub fn root_for(&self, tenant_id: &str) -> PathBuf {
        match self.mode {
            IsolationMode::Isolated => self
                .base
                .join(format!("tenant_{}", sanitize_tenant(tenant_id))),
            IsolationMode::Shared => self.base.clone(),
        }
    }

    /// Chunk directory for a tenant. In shared mode this is one global
    /// directory, which is what makes deduplication cross-tenant.
    pub fn chunk_dir_for(&self, tenant_id: &str) -> PathBuf {
        self.root_for(tenant_id).join("chunks")
    }

    /// Create the tenant's root and chunk directory if absent, restricting
    /// the root's permissions on first creation.
    pub fn ensure_root(&self, tenant_id: &str) -> Result<PathBuf, TenantError> {
        if tenant_id.is_empty() {
            return Err(TenantError::EmptyTenantId);
        }

        let root = self.root_for(tenant_id);
        let created = !root.exists();
        std::fs::create_dir_all(root.join("chunks"))?;
        if created && self.mode == IsolationMode::Isolated {
            self.permissions.restrict(&root)?;
            debug!(tenant = tenant_id, root = %root.display(), "created tenant root");
        }
        Ok(root)
    }

    /// Whether `candidate` resolves inside the tenant's root.
    ///
    /// The check is purely lexical: `.` and `..` components are resolved
    /// without touching the filesystem, then the result is prefix-checked
    /// against the tenant root. Callers must treat `false` as a hard
    /// denial.
    pub fn contains(&self, candidate: &Path, tenant_id: &str) -> bool {
        let root = normalize_lexical(&self.root_for(tenant_id));
        let candidate = normalize_lexical(candidate);
        let inside = candidate.starts_with(&root);
        if !inside {
            warn!(
                tenant = tenant_id,
                candidate = %candidate.display(),
                "path containment check failed"
            );
        }
        inside
    }
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_tenant(tenant_id: &str) -> String {
    tenant_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Resolve `.` and `..` components lexically.
///
/// A `..` that would climb above the path's root is kept, so an escaping
/// path can never normalize into a contained one.
fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
