//! Tenant storage roots, path containment, and quota accounting.
//!
//! A [`TenantContainer`] maps tenant identifiers to directories under a
//! storage base and answers the one security question the storage layer
//! keeps asking: is this path still inside the tenant's root? Alongside it,
//! [`QuotaTracker`] enforces per-tenant byte limits with atomic
//! reservations.
//!
//! Host facilities (disk usage measurement, permission tightening) sit
//! behind the [`DiskUsageProvider`] and [`PermissionSetter`] capability
//! traits so nothing in this crate ever invokes an external command.

mod caps;
mod container;
mod error;
mod quota;

pub use caps::{
    DiskUsageProvider, NoopPermissions, OwnerOnlyPermissions, PermissionSetter, WalkDiskUsage,
};
pub use container::{sanitize_tenant, IsolationMode, TenantContainer};
pub use error::TenantError;
pub use quota::QuotaTracker;
