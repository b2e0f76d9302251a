//! Cache Store Module
//!
//! Generic expiring key-value store: a HashMap of TTL-stamped entries behind
//! a single mutex, with a compute-on-miss helper that keeps the lock released
//! while the compute future runs.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats};

// == Inner State ==
/// Entry map plus statistics, guarded together so every operation observes a
/// consistent pair.
#[derive(Debug, Default)]
struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    stats: CacheStats,
}

// == Expiring Cache ==
/// Thread-safe in-memory cache with per-entry TTL.
///
/// Keys are opaque strings built by callers from stable components (for
/// example `work_item_states:{org}:{project}:{type}`) so distinct logical
/// queries never collide and prefix invalidation stays meaningful. There is
/// no capacity bound: the key space is bounded by the backend's own schema
/// size. Expired entries are removed lazily when observed; a periodic sweep
/// can be layered on top via [`cleanup_expired`](Self::cleanup_expired).
#[derive(Debug)]
pub struct ExpiringCache<V> {
    inner: Mutex<Inner<V>>,
    /// Default TTL in seconds for entries stored without an explicit TTL
    default_ttl: u64,
}

impl<V: Clone> ExpiringCache<V> {
    // == Constructor ==
    /// Creates a new empty cache with the given default TTL in seconds.
    pub fn new(default_ttl: u64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                stats: CacheStats::new(),
            }),
            default_ttl,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Get ==
    /// Retrieves a live value by key.
    ///
    /// An entry observed expired is deleted on the spot so stale data can
    /// never be resurrected by a later read.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.lock();

        if let Some(entry) = inner.entries.get(key) {
            if entry.is_expired() {
                // Remove the expired entry
                inner.entries.remove(key);
                let count = inner.entries.len();
                inner.stats.record_expiration();
                inner.stats.record_miss();
                inner.stats.set_entries(count);
                None
            } else {
                let value = entry.value.clone();
                inner.stats.record_hit();
                Some(value)
            }
        } else {
            inner.stats.record_miss();
            None
        }
    }

    // == Set ==
    /// Stores a value, unconditionally overwriting any existing entry.
    ///
    /// # Arguments
    /// * `key` - The cache key
    /// * `value` - The value to store
    /// * `ttl` - TTL in seconds (uses the default TTL if None)
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<u64>) {
        let entry = CacheEntry::new(value, ttl.unwrap_or(self.default_ttl));

        let mut inner = self.lock();
        inner.entries.insert(key.into(), entry);
        let count = inner.entries.len();
        inner.stats.set_entries(count);
    }

    // == Get Or Compute ==
    /// Returns the cached value for `key`, computing and storing it on miss.
    ///
    /// The compute future runs with the cache lock released, so one slow
    /// fetch never serializes unrelated cache traffic. The tradeoff is that
    /// concurrent misses on the same key may each invoke their compute
    /// function; the last writer wins, which is acceptable for idempotent
    /// metadata reads.
    ///
    /// Compute failures propagate to the caller and are never stored, so the
    /// next call retries the fetch instead of observing a cached failure.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        key: &str,
        ttl: Option<u64>,
        compute: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        debug!(key, "cache miss, computing value");
        let value = compute().await?;
        self.set(key, value.clone(), ttl);
        Ok(value)
    }

    // == Invalidate ==
    /// Removes a single entry if present. Returns whether an entry existed.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut inner = self.lock();
        let removed = inner.entries.remove(key).is_some();
        let count = inner.entries.len();
        inner.stats.set_entries(count);
        removed
    }

    // == Invalidate Prefix ==
    /// Removes every entry whose key starts with `prefix`.
    ///
    /// Used to bulk-drop all cached facts about one project when the caller
    /// knows the schema changed. Returns the number of entries removed.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|key, _| !key.starts_with(prefix));
        let count = inner.entries.len();
        inner.stats.set_entries(count);
        before - count
    }

    // == Clear ==
    /// Drops all entries.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.stats.set_entries(0);
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired());
        let count = inner.entries.len();
        for _ in count..before {
            inner.stats.record_expiration();
        }
        inner.stats.set_entries(count);
        before - count
    }

    // == Length ==
    /// Returns the current number of entries, including not-yet-observed
    /// expired ones.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let mut stats = inner.stats.clone();
        stats.set_entries(inner.entries.len());
        stats
    }

    // == Default TTL ==
    /// The TTL in seconds applied when `set` is called without one.
    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread::sleep;
    use std::time::Duration;

    use crate::error::DevOpsError;

    fn test_cache() -> ExpiringCache<String> {
        ExpiringCache::new(300)
    }

    #[test]
    fn test_get_unknown_key() {
        let cache = test_cache();
        assert!(cache.get("never_written").is_none());
    }

    #[test]
    fn test_set_and_get() {
        let cache = test_cache();

        cache.set("key1", "value1".to_string(), None);

        assert_eq!(cache.get("key1"), Some("value1".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_overwrite() {
        let cache = test_cache();

        cache.set("key1", "value1".to_string(), None);
        cache.set("key1", "value2".to_string(), None);

        assert_eq!(cache.get("key1"), Some("value2".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let cache = test_cache();

        cache.set("key1", "value1".to_string(), Some(0));

        assert!(cache.get("key1").is_none());
        // The expired entry was dropped on observation
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_ttl_expiration() {
        let cache = test_cache();

        cache.set("key1", "value1".to_string(), Some(1));
        assert!(cache.get("key1").is_some());

        sleep(Duration::from_millis(1100));

        assert!(cache.get("key1").is_none());
    }

    #[test]
    fn test_invalidate() {
        let cache = test_cache();

        cache.set("key1", "value1".to_string(), None);

        assert!(cache.invalidate("key1"));
        assert!(!cache.invalidate("key1"));
        assert!(cache.get("key1").is_none());
    }

    #[test]
    fn test_invalidate_prefix_removes_all_and_only_matches() {
        let cache = test_cache();

        cache.set("a:1", "v".to_string(), None);
        cache.set("a:2", "v".to_string(), None);
        cache.set("b:1", "v".to_string(), None);

        let removed = cache.invalidate_prefix("a:");

        assert_eq!(removed, 2);
        assert!(cache.get("a:1").is_none());
        assert!(cache.get("a:2").is_none());
        assert_eq!(cache.get("b:1"), Some("v".to_string()));
    }

    #[test]
    fn test_clear() {
        let cache = test_cache();

        cache.set("key1", "value1".to_string(), None);
        cache.set("key2", "value2".to_string(), None);

        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.get("key1").is_none());
    }

    #[test]
    fn test_cleanup_expired() {
        let cache = test_cache();

        cache.set("short", "v".to_string(), Some(1));
        cache.set("long", "v".to_string(), Some(60));

        sleep(Duration::from_millis(1100));

        let removed = cache.cleanup_expired();
        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("long").is_some());
    }

    #[test]
    fn test_stats() {
        let cache = test_cache();

        cache.set("key1", "value1".to_string(), None);
        cache.get("key1"); // hit
        cache.get("missing"); // miss

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn test_get_or_compute_computes_once_on_miss() {
        let cache = test_cache();
        let calls = AtomicUsize::new(0);

        let value: Result<String, DevOpsError> = cache
            .get_or_compute("key", None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("computed".to_string())
            })
            .await;

        assert_eq!(value.unwrap(), "computed");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_compute_skips_compute_when_live() {
        let cache = test_cache();
        cache.set("key", "cached".to_string(), None);
        let calls = AtomicUsize::new(0);

        let value: Result<String, DevOpsError> = cache
            .get_or_compute("key", None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("computed".to_string())
            })
            .await;

        assert_eq!(value.unwrap(), "cached");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_get_or_compute_failure_is_not_cached() {
        let cache = test_cache();
        let calls = AtomicUsize::new(0);

        let result: Result<String, DevOpsError> = cache
            .get_or_compute("key", None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(DevOpsError::fetch("test", "boom"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(cache.len(), 0);

        // A later call retries the compute and can succeed
        let value: Result<String, DevOpsError> = cache
            .get_or_compute("key", None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("second try".to_string())
            })
            .await;

        assert_eq!(value.unwrap(), "second try");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_get_or_compute_respects_ttl() {
        let cache = test_cache();

        let _: Result<String, DevOpsError> = cache
            .get_or_compute("key", Some(0), || async { Ok("gone".to_string()) })
            .await;

        // Stored with zero TTL, so already expired for the next reader
        assert!(cache.get("key").is_none());
    }
}
