//! Memoizing TTL cache in front of provider fetches.
//!
//! Entries expire lazily: an entry past its TTL is dropped the next time it
//! is looked up and the caller falls through to the factory. There is no
//! background sweep.
//!
//! Concurrent misses for the same key are not coalesced. Each caller runs its
//! own factory and the last one to finish wins. Fetches are idempotent reads,
//! so the only cost is duplicate upstream traffic.

use std::future::Future;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

/// Upper bound used when `now + ttl` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// String-keyed cache with a per-entry expiry.
///
/// Values are cloned out on every hit, so `V` is usually cheap to clone
/// (`Arc<T>` or a `Copy` scalar).
pub struct RateCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
}

impl<V: Clone> RateCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Returns the live value for `key`, evicting it if it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let entry = self.entries.get(key)?;
            if entry.is_live(now) {
                debug!(key, "Cache hit");
                return Some(entry.value.clone());
            }
        }
        debug!(key, "Cache entry expired");
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        None
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub fn insert(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + FAR_FUTURE);
        self.entries
            .insert(key.into(), CacheEntry { value, expires_at });
    }

    /// Removes `key`, returning its value whether or not it had expired.
    pub fn remove(&self, key: &str) -> Option<V> {
        self.entries.remove(key).map(|(_, entry)| entry.value)
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    /// Returns the cached value for `key` or runs `factory` and caches its
    /// result for `ttl`.
    ///
    /// A failed factory caches nothing and its error is returned unchanged.
    pub async fn get_or_create<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        factory: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        debug!(key, "Cache miss");
        let value = factory().await?;
        self.insert(key, value.clone(), ttl);
        Ok(value)
    }
}

impl<V: Clone> Default for RateCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
