//! Bounded least-recently-used caching of decompressed entry bodies.
//!
//! [`LruCache`] layers this crate's rules over [`lru::LruCache`]: an insert
//! never replaces a resident entry, membership tests leave recency alone,
//! and a capacity of zero caches nothing.
//!
//! [`BodyCache`] wraps it in a mutex for use behind a shared filesystem
//! session.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

/// Capacity used when the caller does not pick one.
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

/// Fixed-capacity key/value cache with strict recency-ordered eviction.
pub struct LruCache<K: Hash + Eq, V> {
    /// `None` when built with capacity 0.
    inner: Option<lru::LruCache<K, V>>,
}

impl<K: Hash + Eq, V> LruCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: NonZeroUsize::new(capacity).map(lru::LruCache::new),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.as_ref().map_or(0, |c| c.cap().get())
    }

    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |c| c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Membership test. Does not touch recency.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.as_ref().is_some_and(|c| c.contains(key))
    }

    /// Look up `key`, promoting it to most recently used on a hit.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.inner.as_mut()?.get(key)
    }

    /// Insert `key` as the most recently used entry.
    ///
    /// An existing entry is left untouched (first write wins). When the cache
    /// is full the least recently used entry is evicted and returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        let cache = self.inner.as_mut()?;
        if cache.contains(&key) {
            return None;
        }
        cache.push(key, value)
    }

    pub fn clear(&mut self) {
        if let Some(cache) = self.inner.as_mut() {
            cache.clear();
        }
    }
}

/// Thread-safe cache of decompressed bodies keyed by entry index.
///
/// Each operation takes the lock once, so a promoting `get` can never
/// interleave with an evicting `insert`.
pub struct BodyCache {
    inner: Mutex<LruCache<usize, Arc<[u8]>>>,
}

impl BodyCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, index: usize) -> Option<Arc<[u8]>> {
        self.lock().get(&index).cloned()
    }

    pub fn insert(&self, index: usize, body: Arc<[u8]>) {
        if let Some((evicted, _)) = self.lock().insert(index, body) {
            debug!(evicted, inserted = index, "evicted cached body");
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.lock().contains(&index)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // No operation panics midway, so a poisoned lock still guards a
    // consistent cache.
    fn lock(&self) -> MutexGuard<'_, LruCache<usize, Arc<[u8]>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for BodyCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
