//! Keyed entry storage for the resource query cache.
//!
//! At most one authoritative entry per key. Capacity is bounded by LRU
//! eviction; freshness is a window checked at read time. Writes replace the
//! prior entry wholesale; merging is the caller's business.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use lru::LruCache;
use metrics::counter;

use super::lock::{read_guard, write_guard};

#[derive(Debug, Clone)]
struct CachedEntry<V> {
    value: V,
    stored_at: Instant,
}

/// LRU-bounded store of cached entries for one resource kind.
pub struct EntryStore<K: Hash + Eq, V> {
    kind: &'static str,
    entries: RwLock<LruCache<K, CachedEntry<V>>>,
    stale_after: Option<Duration>,
}

impl<K, V> EntryStore<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new(kind: &'static str, capacity: NonZeroUsize, stale_after: Option<Duration>) -> Self {
        Self {
            kind,
            entries: RwLock::new(LruCache::new(capacity)),
            stale_after,
        }
    }

    /// Fresh value for `key`, if present and inside the freshness window.
    /// Counts a hit or miss against the kind's metrics.
    pub fn fresh(&self, key: &K) -> Option<V> {
        let mut guard = write_guard(&self.entries, "entry_store.fresh");
        match guard.get(key) {
            Some(entry) if self.is_fresh(entry) => {
                counter!("ammesso_cache_hit_total", "kind" => self.kind).increment(1);
                Some(entry.value.clone())
            }
            _ => {
                counter!("ammesso_cache_miss_total", "kind" => self.kind).increment(1);
                None
            }
        }
    }

    /// Fresh value for `key` without touching recency order or metrics.
    pub fn peek_fresh(&self, key: &K) -> Option<V> {
        let guard = read_guard(&self.entries, "entry_store.peek_fresh");
        guard
            .peek(key)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.value.clone())
    }

    /// Value stored strictly after `after`, regardless of freshness.
    pub fn stored_since(&self, key: &K, after: Instant) -> Option<V> {
        let guard = read_guard(&self.entries, "entry_store.stored_since");
        guard
            .peek(key)
            .filter(|entry| entry.stored_at > after)
            .map(|entry| entry.value.clone())
    }

    /// Store or replace the entry for `key`.
    pub fn put(&self, key: K, value: V) {
        let mut guard = write_guard(&self.entries, "entry_store.put");
        self.push_entry(&mut guard, key, value);
    }

    /// Store unless a newer entry landed after `started`.
    ///
    /// Used by fetch completion so that a mutation write applied mid-flight
    /// wins over the fetch result.
    pub fn put_unless_newer(&self, key: K, value: V, started: Instant) {
        let mut guard = write_guard(&self.entries, "entry_store.put_unless_newer");
        if let Some(existing) = guard.peek(&key)
            && existing.stored_at > started
        {
            return;
        }
        self.push_entry(&mut guard, key, value);
    }

    pub fn invalidate(&self, key: &K) {
        write_guard(&self.entries, "entry_store.invalidate").pop(key);
    }

    pub fn clear(&self) {
        write_guard(&self.entries, "entry_store.clear").clear();
    }

    pub fn len(&self) -> usize {
        read_guard(&self.entries, "entry_store.len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push_entry(&self, guard: &mut LruCache<K, CachedEntry<V>>, key: K, value: V) {
        let evicted = guard.push(
            key.clone(),
            CachedEntry {
                value,
                stored_at: Instant::now(),
            },
        );
        // push also returns the displaced pair when replacing the same key;
        // only count true capacity evictions.
        if let Some((old_key, _)) = evicted
            && old_key != key
        {
            counter!("ammesso_cache_evict_total", "kind" => self.kind).increment(1);
        }
    }

    fn is_fresh(&self, entry: &CachedEntry<V>) -> bool {
        match self.stale_after {
            None => true,
            Some(window) => entry.stored_at.elapsed() <= window,
        }
    }
}
