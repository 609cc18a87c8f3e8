//! Resolution cache type definitions

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::core::permission::SubjectType;

/// Cache key: `(subject_type, subject_id, tenant_id)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Subject kind the snapshot belongs to
    pub subject_type: SubjectType,
    /// Subject identifier
    pub subject_id: String,
    /// Tenant scope
    pub tenant_id: String,
}

impl CacheKey {
    /// Key for a user-level snapshot
    pub fn user(subject_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            subject_type: SubjectType::User,
            subject_id: subject_id.into(),
            tenant_id: tenant_id.into(),
        }
    }

    /// Key for a role-level snapshot
    pub fn role(role_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            subject_type: SubjectType::Role,
            subject_id: role_id.into(),
            tenant_id: tenant_id.into(),
        }
    }
}

/// Cache entry with metadata
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The cached value
    pub value: T,
    /// When the entry was created
    pub created_at: Instant,
    /// When the entry expires
    pub expires_at: Instant,
    /// Access count for popularity tracking
    pub access_count: u64,
    /// Last access time
    pub last_accessed: Instant,
}

impl<T> CacheEntry<T> {
    /// Create a new cache entry
    pub fn new(value: T, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            expires_at: now + ttl,
            access_count: 0,
            last_accessed: now,
        }
    }

    /// Check if the entry is expired
    pub fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }

    /// Mark the entry as accessed
    pub fn mark_accessed(&mut self) {
        self.access_count += 1;
        self.last_accessed = Instant::now();
    }

    /// Get the age of the entry
    pub fn age(&self) -> Duration {
        Instant::now().duration_since(self.created_at)
    }
}

/// Atomic cache statistics for lock-free hot path updates
#[derive(Debug, Default)]
pub struct AtomicCacheStats {
    /// Cache hits
    pub hits: AtomicU64,
    /// Cache misses (absent, expired, or stale)
    pub misses: AtomicU64,
    /// Misses caused specifically by a stale source version
    pub stale_version_misses: AtomicU64,
    /// Entries removed by expiry cleanup or capacity eviction
    pub evictions: AtomicU64,
}

impl AtomicCacheStats {
    /// Create a snapshot of current stats
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale_version_misses: self.stale_version_misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Reset all stats to zero
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.stale_version_misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }
}

/// Cache statistics snapshot (returned to callers)
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Cache hits
    pub hits: u64,
    /// Cache misses (absent, expired, or stale)
    pub misses: u64,
    /// Misses caused specifically by a stale source version
    pub stale_version_misses: u64,
    /// Entries removed by expiry cleanup or capacity eviction
    pub evictions: u64,
}

impl CacheStats {
    /// Hit rate as a percentage: `hits / (hits + misses) * 100`
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }
}
