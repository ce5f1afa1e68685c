// Bounded in-memory cache with per-entry TTL and FIFO eviction
//
// Expiry is checked lazily on read; stale entries stay until they are
// evicted by capacity or `clear`. Eviction follows insertion order, not
// access recency.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
}

struct CacheEntry<V> {
    payload: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }
}

struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Keys in first-insertion order
    order: VecDeque<String>,
}

/// Shared key -> value store; safe to use from concurrent resolutions.
pub struct TtlCache<V> {
    inner: Mutex<CacheInner<V>>,
    max_size: usize,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(max_size: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            max_size,
        }
    }

    /// Fresh value for `key`, or `None` if missing or expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let inner = self.inner.lock();
        inner
            .entries
            .get(key)
            .filter(|entry| entry.is_fresh(Instant::now()))
            .map(|entry| entry.payload.clone())
    }

    /// Insert or overwrite, then evict the oldest key if over capacity.
    ///
    /// Overwriting keeps the key's first-insertion slot in the eviction order.
    pub fn put(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let mut inner = self.inner.lock();

        let entry = CacheEntry {
            payload: value,
            stored_at: Instant::now(),
            ttl,
        };
        if inner.entries.insert(key.clone(), entry).is_none() {
            inner.order.push_back(key);
        }

        if inner.entries.len() > self.max_size {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
                tracing::debug!("[Cache] Evicted {}", oldest);
            }
        }
    }

    /// True if the key is stored at all, fresh or not
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.inner.lock().entries.len(),
            max_size: self.max_size,
        }
    }
}
