//! Screening result cache (in-memory).
//!
//! Keyed by the 32-byte screening key from [`crate::hashing::screening_key`]
//! and storing complete [`ScreeningResult`]s. Capacity eviction is
//! LRU-flavoured; every entry additionally carries its own TTL, and whichever
//! limit triggers first wins. Lookups return an owned copy of the stored
//! result, never a shared reference into the cache.

use moka::notification::RemovalCause;
use moka::{Expiry, sync::Cache};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::error::{CacheError, CacheResult};
use crate::hashing::ScreeningKey;
use crate::pipeline::ScreeningResult;

/// Counter snapshot for operational monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetrics {
    /// Lookups that returned a stored result.
    pub hits: u64,
    /// Lookups that found nothing (or only an expired entry).
    pub misses: u64,
    /// Entries dropped by capacity pressure or TTL expiry.
    pub evictions: u64,
    /// Current entry count (after pending maintenance).
    pub entries: u64,
}

impl CacheMetrics {
    /// Fraction of lookups that hit, in `[0, 1]`. Zero before any lookup.
    #[inline]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

/// Stored value paired with the TTL it was written under.
#[derive(Clone)]
struct CachedScreening {
    result: ScreeningResult,
    ttl: Duration,
}

/// Expiration policy reading each entry's own TTL.
struct PerEntryTtl;

impl Expiry<ScreeningKey, CachedScreening> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &ScreeningKey,
        value: &CachedScreening,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &ScreeningKey,
        value: &CachedScreening,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // A rewrite restarts the clock with the new entry's TTL.
        Some(value.ttl)
    }
}

/// Thread-safe memoization of complete screening results.
pub struct DecisionCache {
    entries: Cache<ScreeningKey, CachedScreening>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: Arc<AtomicU64>,
}

impl DecisionCache {
    const DEFAULT_CAPACITY: u64 = 50_000;

    /// Creates a cache with the default capacity.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a cache with a max entry capacity (LRU-flavoured eviction).
    pub fn with_capacity(capacity: u64) -> Self {
        let evictions = Arc::new(AtomicU64::new(0));
        let evicted = Arc::clone(&evictions);
        let entries = Cache::builder()
            .max_capacity(capacity)
            .expire_after(PerEntryTtl)
            .eviction_listener(move |_key, _value, cause| {
                if matches!(cause, RemovalCause::Size | RemovalCause::Expired) {
                    evicted.fetch_add(1, Ordering::Relaxed);
                }
            })
            .build();

        Self {
            entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions,
        }
    }

    /// Looks up a stored result, returning an owned copy on a hit.
    ///
    /// Expired entries count as misses even before maintenance has swept
    /// them out.
    pub fn get(&self, key: &ScreeningKey) -> CacheResult<Option<ScreeningResult>> {
        match self.entries.get(key) {
            Some(cached) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(cached.result))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    /// Stores a result under `key` with a per-entry TTL.
    ///
    /// A zero TTL is rejected with [`CacheError::InvalidTtl`]; callers treat
    /// that as a degradation, not a request failure. Storing under an existing
    /// key replaces the value and restarts its TTL.
    pub fn put(
        &self,
        key: ScreeningKey,
        result: ScreeningResult,
        ttl: Duration,
    ) -> CacheResult<()> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl { ttl });
        }
        self.entries.insert(key, CachedScreening { result, ttl });
        Ok(())
    }

    /// Removes an entry, if present.
    #[inline]
    pub fn invalidate(&self, key: &ScreeningKey) {
        self.entries.invalidate(key);
    }

    /// Returns `true` if a live entry exists for `key` (does not count as a
    /// lookup).
    #[inline]
    pub fn contains(&self, key: &ScreeningKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the number of cached entries.
    #[inline]
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Returns `true` if the cache is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.entry_count() == 0
    }

    /// Clears all entries. Counters are left untouched.
    #[inline]
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    /// Runs any pending maintenance tasks in the underlying cache.
    ///
    /// Entry counts and eviction notifications are processed lazily; tests
    /// call this to observe them deterministically.
    #[inline]
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }

    /// Returns a counter snapshot.
    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.entries.entry_count(),
        }
    }
}

impl Default for DecisionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DecisionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionCache")
            .field("entries", &self.entries.entry_count())
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}
