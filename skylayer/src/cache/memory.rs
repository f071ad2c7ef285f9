//! Cost-bounded in-memory tile cache with LRU eviction.
//!
//! Every entry carries a cost (the decoded image's byte size). The sum of all
//! costs never exceeds the configured maximum: each insert evicts least
//! recently used entries until it fits. An entry that could never fit on its
//! own is rejected with [`EntryTooLarge`] instead of flushing the cache.
//!
//! The cache is owned by a single thread and takes `&mut self` for every
//! operation that touches recency, so there is no interior locking.

use std::fmt;

use lru::LruCache;
use thiserror::Error;
use tracing::debug;

use crate::tile::{TileImage, TileKey};

/// Default maximum cache cost: 256 MB of decoded pixels.
pub const DEFAULT_MAX_COST: usize = 256 * 1024 * 1024;

/// A tile whose cost exceeds the cache's maximum on its own.
///
/// The rejected image is handed back so the caller can still use it once.
#[derive(Error)]
#[error("entry cost {cost} bytes exceeds cache maximum {max_cost} bytes")]
pub struct EntryTooLarge {
    pub key: TileKey,
    pub cost: usize,
    pub max_cost: usize,
    image: TileImage,
}

impl EntryTooLarge {
    /// Recover the rejected image.
    pub fn into_image(self) -> TileImage {
        self.image
    }
}

impl fmt::Debug for EntryTooLarge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryTooLarge")
            .field("key", &self.key)
            .field("cost", &self.cost)
            .field("max_cost", &self.max_cost)
            .finish_non_exhaustive()
    }
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
    pub used_cost: usize,
    pub max_cost: usize,
}

impl CacheStats {
    /// Hit rate in `[0, 1]`, or 0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheEntry {
    image: TileImage,
    cost: usize,
}

/// Bounded-cost cache from [`TileKey`] to decoded [`TileImage`].
pub struct TileCache {
    entries: LruCache<TileKey, CacheEntry>,
    used_cost: usize,
    max_cost: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl TileCache {
    /// Create a cache holding at most `max_cost` bytes.
    pub fn new(max_cost: usize) -> Self {
        Self {
            entries: LruCache::unbounded(),
            used_cost: 0,
            max_cost,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Look up a tile, marking it most recently used on a hit.
    pub fn get(&mut self, key: &TileKey) -> Option<&TileImage> {
        match self.entries.get(key) {
            Some(entry) => {
                self.hits += 1;
                Some(&entry.image)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Look up a tile without touching recency or counters.
    pub fn peek(&self, key: &TileKey) -> Option<&TileImage> {
        self.entries.peek(key).map(|entry| &entry.image)
    }

    /// Whether a key is cached, without touching its recency.
    pub fn contains(&self, key: &TileKey) -> bool {
        self.entries.contains(key)
    }

    /// Insert a tile with the given cost.
    ///
    /// Replaces any existing entry for `key`, then evicts least recently
    /// used entries until the total cost is within the maximum.
    ///
    /// # Errors
    ///
    /// Returns [`EntryTooLarge`], carrying the image, when `cost` alone
    /// exceeds the maximum. The cache is left untouched in that case.
    pub fn put(&mut self, key: TileKey, image: TileImage, cost: usize) -> Result<(), EntryTooLarge> {
        if cost > self.max_cost {
            return Err(EntryTooLarge {
                key,
                cost,
                max_cost: self.max_cost,
                image,
            });
        }

        if let Some(old) = self.entries.pop(&key) {
            self.used_cost -= old.cost;
        }
        self.entries.put(key, CacheEntry { image, cost });
        self.used_cost += cost;
        self.evict_to(self.max_cost);
        Ok(())
    }

    /// Remove one entry, returning its image.
    pub fn remove(&mut self, key: &TileKey) -> Option<TileImage> {
        self.entries.pop(key).map(|entry| {
            self.used_cost -= entry.cost;
            entry.image
        })
    }

    /// Change the maximum cost, evicting immediately if it shrank.
    pub fn set_max_cost(&mut self, max_cost: usize) {
        self.max_cost = max_cost;
        self.evict_to(max_cost);
    }

    /// Current total cost of all entries.
    pub fn used_cost(&self) -> usize {
        self.used_cost
    }

    pub fn max_cost(&self) -> usize {
        self.max_cost
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.used_cost = 0;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            entries: self.entries.len(),
            used_cost: self.used_cost,
            max_cost: self.max_cost,
        }
    }

    fn evict_to(&mut self, limit: usize) {
        while self.used_cost > limit {
            let Some((key, entry)) = self.entries.pop_lru() else {
                break;
            };
            self.used_cost -= entry.cost;
            self.evictions += 1;
            debug!(key = %key, cost = entry.cost, used = self.used_cost, "Evicted tile");
        }
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_COST)
    }
}
