//! In-memory [`ContextCache`].
//!
//! Bounded by entry count. When full, the least recently used entry is
//! evicted; both `get` hits and `put` count as a use.

use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use crate::pipeline::PipelineOutput;
use crate::traits::ContextCache;

/// Counters since the cache was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

struct Entry {
    value: PipelineOutput,
    last_used: u64,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    tick: u64,
    stats: CacheStats,
}

impl Inner {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_used)
            .map(|(k, _)| k.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
            self.stats.evictions += 1;
            debug!(key = %key, "evicted cache entry");
        }
    }
}

/// LRU cache of finished pipeline outputs, safe to share across threads.
pub struct MemoryCache {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl MemoryCache {
    /// A cache holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ContextCache for MemoryCache {
    fn get(&self, key: &str) -> Option<PipelineOutput> {
        let mut inner = self.lock();
        let tick = inner.next_tick();
        match inner.entries.get_mut(key) {
            Some(entry) => {
                entry.last_used = tick;
                let value = entry.value.clone();
                inner.stats.hits += 1;
                Some(value)
            }
            None => {
                inner.stats.misses += 1;
                None
            }
        }
    }

    fn put(&self, key: String, value: PipelineOutput) {
        let mut inner = self.lock();
        let tick = inner.next_tick();
        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.capacity {
            inner.evict_lru();
        }
        inner.entries.insert(
            key,
            Entry {
                value,
                last_used: tick,
            },
        );
    }
}
