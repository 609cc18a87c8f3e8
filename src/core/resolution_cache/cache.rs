//! Resolution cache implementation
//!
//! A TTL cache over `DashMap` with two staleness signals per entry: wall-clock
//! expiry and the per-tenant `source_version` counter. Invalidating a role
//! bumps the tenant counter; entries computed against an older counter are
//! treated as misses on their next read, which invalidates every snapshot
//! that could have depended on the role without tracking reverse
//! dependencies.
//!
//! Recomputation is guarded per key: concurrent callers for the same expired
//! key subscribe to one in-flight computation instead of each walking the
//! role graph.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::FutureExt;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::CacheConfig;
use crate::core::permission::ResolvedPermissionSet;
use crate::utils::error::{AuthzError, Result};

use super::types::{AtomicCacheStats, CacheEntry, CacheKey, CacheStats};

/// Result delivered to every caller of one in-flight computation.
type FlightResult = Result<ResolvedPermissionSet>;

struct CacheInner {
    /// Cached snapshots
    entries: DashMap<CacheKey, CacheEntry<ResolvedPermissionSet>>,
    /// Per-tenant source version counters; never decremented, reset only by `clear`
    versions: DashMap<String, Arc<AtomicU64>>,
    /// In-flight computations, one slot per key
    inflight: DashMap<CacheKey, broadcast::Sender<FlightResult>>,
    /// Cache configuration
    config: CacheConfig,
    /// Cache statistics (lock-free atomics for hot path)
    stats: AtomicCacheStats,
}

/// Tenant-scoped TTL cache for resolved permission snapshots.
///
/// Cheap to clone; clones share the same underlying cache.
#[derive(Clone)]
pub struct ResolutionCache {
    inner: Arc<CacheInner>,
}

impl ResolutionCache {
    /// Create a new resolution cache
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: DashMap::new(),
                versions: DashMap::new(),
                inflight: DashMap::new(),
                config,
                stats: AtomicCacheStats::default(),
            }),
        }
    }

    /// Default entry TTL from configuration
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.inner.config.ttl)
    }

    /// Get a cached snapshot.
    ///
    /// Returns `None` for absent, expired, and version-stale entries; the
    /// stale cases also remove the dead entry.
    pub fn get(&self, key: &CacheKey) -> Option<ResolvedPermissionSet> {
        let current = self.current_version(&key.tenant_id);

        let mut expired = false;
        let mut stale = false;
        if let Some(mut entry) = self.inner.entries.get_mut(key) {
            if entry.is_expired() {
                expired = true;
            } else if entry.value.source_version < current {
                stale = true;
            } else {
                entry.mark_accessed();
                let value = entry.value.clone();
                self.inner.stats.hits.fetch_add(1, Ordering::Relaxed);
                debug!(?key, "cache hit");
                return Some(value);
            }
        }

        // Re-check under the removal predicate so a concurrent recompute
        // that just landed a fresh entry is not swept out with the dead one.
        if expired {
            self.inner
                .entries
                .remove_if(key, |_, entry| entry.is_expired());
            debug!(?key, "cache entry expired");
        } else if stale {
            self.inner
                .entries
                .remove_if(key, |_, entry| entry.value.source_version < current);
            self.inner
                .stats
                .stale_version_misses
                .fetch_add(1, Ordering::Relaxed);
            debug!(?key, current, "cache entry stale by source version");
        }

        self.inner.stats.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a snapshot with the given TTL
    pub fn put(&self, key: CacheKey, value: ResolvedPermissionSet, ttl: Duration) {
        self.inner.store_entry(key, value, ttl);
    }

    /// Remove a single entry
    pub fn invalidate(&self, key: &CacheKey) {
        self.inner.entries.remove(key);
        debug!(?key, "cache entry invalidated");
    }

    /// Invalidate every entry whose computation could have depended on
    /// `role_id` by bumping the tenant's source version. Entries with an
    /// older version are lazily treated as misses on next read.
    pub fn invalidate_role(&self, tenant_id: &str, role_id: &str) {
        let version = self.bump_version(tenant_id);
        self.inner.entries.remove(&CacheKey::role(role_id, tenant_id));
        debug!(tenant_id, role_id, version, "role invalidated");
    }

    /// Invalidate every entry for a tenant
    pub fn invalidate_tenant(&self, tenant_id: &str) {
        let version = self.bump_version(tenant_id);
        self.inner
            .entries
            .retain(|key, _| key.tenant_id != tenant_id);
        info!(tenant_id, version, "tenant cache invalidated");
    }

    /// Current source version for a tenant (0 if never bumped)
    pub fn current_version(&self, tenant_id: &str) -> u64 {
        self.inner
            .versions
            .get(tenant_id)
            .map(|counter| counter.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Bump a tenant's source version, returning the new value
    pub fn bump_version(&self, tenant_id: &str) -> u64 {
        self.inner.version_counter(tenant_id).fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Get or recompute a snapshot behind the per-key single-flight guard.
    ///
    /// At most one computation runs per key at a time; concurrent callers
    /// subscribe to the in-flight result. The computation itself runs on a
    /// detached task, so a caller that goes away only detaches and the
    /// remaining waiters still get the result. Failures are delivered to
    /// every waiter and never cached.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: CacheKey,
        ttl: Duration,
        compute: F,
    ) -> Result<ResolvedPermissionSet>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ResolvedPermissionSet>> + Send + 'static,
    {
        if !self.inner.config.enabled {
            return compute().await;
        }

        if let Some(found) = self.get(&key) {
            return Ok(found);
        }

        let mut rx = match self.inner.inflight.entry(key.clone()) {
            Entry::Occupied(slot) => {
                let rx = slot.get().subscribe();
                drop(slot);
                rx
            }
            Entry::Vacant(slot) => {
                let (tx, rx) = broadcast::channel(1);
                slot.insert(tx.clone());

                let inner = Arc::clone(&self.inner);
                let task_key = key;
                let fut = compute();
                tokio::spawn(async move {
                    let result = match AssertUnwindSafe(fut).catch_unwind().await {
                        Ok(result) => result,
                        Err(_) => Err(AuthzError::Cache("resolution task panicked".to_string())),
                    };
                    if let Ok(snapshot) = &result {
                        inner.store_entry(task_key.clone(), snapshot.clone(), ttl);
                    }
                    // Free the slot before publishing so a caller arriving
                    // after the send becomes a fresh leader instead of
                    // subscribing to a finished flight.
                    inner.inflight.remove(&task_key);
                    let _ = tx.send(result);
                });

                rx
            }
        };

        match rx.recv().await {
            Ok(result) => result,
            Err(_) => Err(AuthzError::Cache(
                "in-flight resolution dropped without publishing".to_string(),
            )),
        }
    }

    /// Get cache statistics (lock-free snapshot)
    pub fn stats(&self) -> CacheStats {
        self.inner.stats.snapshot()
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Clear all entries, version counters, and statistics
    pub fn clear(&self) {
        self.inner.entries.clear();
        self.inner.versions.clear();
        self.inner.stats.reset();
        info!("resolution cache cleared");
    }
}

impl CacheInner {
    fn version_counter(&self, tenant_id: &str) -> Arc<AtomicU64> {
        self.versions
            .entry(tenant_id.to_string())
            .or_insert_with(|| Arc::new(AtomicU64::new(0)))
            .clone()
    }

    fn store_entry(&self, key: CacheKey, value: ResolvedPermissionSet, ttl: Duration) {
        if self.entries.len() >= self.config.max_entries {
            self.cleanup_expired();
            while self.entries.len() >= self.config.max_entries {
                if !self.evict_oldest() {
                    break;
                }
            }
        }
        self.entries.insert(key, CacheEntry::new(value, ttl));
    }

    /// Clean up expired entries
    fn cleanup_expired(&self) {
        let mut removed = 0u64;
        self.entries.retain(|_, entry| {
            if entry.is_expired() {
                removed += 1;
                false
            } else {
                true
            }
        });
        if removed > 0 {
            self.stats.evictions.fetch_add(removed, Ordering::Relaxed);
            debug!(removed, "cleaned up expired cache entries");
        }
    }

    /// Evict the entry closest to expiry. Returns false when the cache is empty.
    fn evict_oldest(&self) -> bool {
        let victim = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().expires_at)
            .map(|entry| entry.key().clone());
        match victim {
            Some(key) => {
                self.entries.remove(&key);
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }
}
