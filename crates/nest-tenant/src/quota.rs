//! Per-tenant storage quota accounting.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::caps::DiskUsageProvider;
use crate::error::TenantError;

/// Tracks used bytes per tenant against a fixed limit.
///
/// Reservation is a single atomic increment-if-capacity-remains on the
/// tenant's counter, so two concurrent uploads can never both slip under
/// the limit by checking before writing. Callers reserve before any chunk
/// is written and release if the ingestion fails.
pub struct QuotaTracker {
    limit_bytes: u64,
    used: RwLock<HashMap<String, Arc<AtomicU64>>>,
}

impl QuotaTracker {
    /// Create a tracker where every tenant gets the same byte limit.
    pub fn new(limit_bytes: u64) -> Self {
        Self {
            limit_bytes,
            used: RwLock::new(HashMap::new()),
        }
    }

    /// Per-tenant limit in bytes.
    pub fn limit_bytes(&self) -> u64 {
        self.limit_bytes
    }

    /// Bytes currently accounted to a tenant.
    pub fn used_bytes(&self, tenant_id: &str) -> u64 {
        self.used
            .read()
            .expect("lock poisoned")
            .get(tenant_id)
            .map(|counter| counter.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Atomically reserve `n` bytes for a tenant.
    ///
    /// Returns `false` without changing the counter if the reservation
    /// would exceed the limit.
    pub fn reserve(&self, tenant_id: &str, n: u64) -> bool {
        let counter = self.counter(tenant_id);
        let reserved = counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                used.checked_add(n).filter(|&next| next <= self.limit_bytes)
            })
            .is_ok();
        if !reserved {
            debug!(
                tenant = tenant_id,
                requested = n,
                limit = self.limit_bytes,
                "quota reservation denied"
            );
        }
        reserved
    }

    /// Return `n` previously reserved bytes to a tenant.
    pub fn release(&self, tenant_id: &str, n: u64) {
        let counter = self.counter(tenant_id);
        // Saturating: releasing more than was reserved is a caller bug but
        // must not wrap the counter into a huge value.
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                Some(used.saturating_sub(n))
            })
            .ok();
    }

    /// Seed a tenant's counter from a disk scan so existing data counts
    /// against the limit after a restart.
    pub fn preload(
        &self,
        tenant_id: &str,
        root: &std::path::Path,
        usage: &dyn DiskUsageProvider,
    ) -> Result<u64, TenantError> {
        let existing = usage.usage_bytes(root)?;
        self.counter(tenant_id).store(existing, Ordering::SeqCst);
        debug!(tenant = tenant_id, used = existing, "preloaded quota counter");
        Ok(existing)
    }

    fn counter(&self, tenant_id: &str) -> Arc<AtomicU64> {
        if let Some(counter) = self.used.read().expect("lock poisoned").get(tenant_id) {
            return counter.clone();
        }
        self.used
            .write()
            .expect("lock poisoned")
            .entry(tenant_id.to_string())
            .or_default()
            .clone()
    }
}
