//! TTL Cache Store
//!
//! Bounded map of memoised values with per-entry expiry and oldest-first
//! eviction.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::cache::{CacheEntry, CacheStats, InsertionOrder};

// == TTL Cache ==
/// Bounded key-value store with lazy expiry.
///
/// When a new key arrives at capacity the key inserted earliest is evicted.
/// This is insertion order, not access order: reads never protect an entry.
///
/// Every explicit delete or clear bumps a generation counter. A value read
/// from the backend before an invalidation can be stored with
/// [`TtlCache::set_if_generation`] and is dropped if the counter moved.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    order: InsertionOrder,
    stats: CacheStats,
    max_entries: usize,
    default_ttl: Duration,
    generation: u64,
}

impl<V: Clone> TtlCache<V> {
    // == Constructor ==
    /// Creates an empty cache.
    ///
    /// # Arguments
    /// * `max_entries` - capacity, clamped to at least one entry
    /// * `default_ttl` - freshness applied by [`TtlCache::set`]
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            stats: CacheStats::new(max_entries),
            max_entries,
            default_ttl,
            generation: 0,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Number of invalidations (deletes and clears) seen so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // == Get ==
    /// Returns a fresh value, or None.
    ///
    /// A stale entry is removed as part of the read and counted as a miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&mut self, key: &str, now: Instant) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_expirations(1);
        }
        self.stats.record_miss();
        None
    }

    // == Set ==
    /// Stores a value with the default TTL.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let ttl = self.default_ttl;
        self.set_with_ttl(key, value, ttl);
    }

    /// Stores a value with an explicit TTL, overwriting any previous entry.
    pub fn set_with_ttl(&mut self, key: impl Into<String>, value: V, ttl: Duration) {
        self.set_at(key, value, ttl, Instant::now());
    }

    pub fn set_at(&mut self, key: impl Into<String>, value: V, ttl: Duration, now: Instant) {
        let key = key.into();

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            if let Some(oldest) = self.order.evict_oldest() {
                self.entries.remove(&oldest);
                self.stats.record_eviction();
            }
        }

        self.order.push(&key);
        self.entries
            .insert(key, CacheEntry::stored_at(value, ttl, now));
        self.stats.set_size(self.entries.len());
    }

    /// Stores a value only if no invalidation happened since `generation`
    /// was read; returns whether it was stored.
    pub fn set_if_generation(
        &mut self,
        key: impl Into<String>,
        value: V,
        ttl: Duration,
        generation: u64,
    ) -> bool {
        if self.generation != generation {
            return false;
        }
        self.set_with_ttl(key, value, ttl);
        true
    }

    // == Delete ==
    /// Removes a key; returns whether it was present.
    ///
    /// The generation moves even when the key is absent, since a fetch for
    /// it may be in flight.
    pub fn delete(&mut self, key: &str) -> bool {
        self.generation += 1;
        self.remove_entry(key)
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.generation += 1;
        self.entries.clear();
        self.order.clear();
        self.stats.set_size(0);
    }

    // == Purge Expired ==
    /// Drops every stale entry; returns how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&mut self, now: Instant) -> usize {
        let stale: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &stale {
            self.remove_entry(key);
        }
        self.stats.record_expirations(stale.len());
        stale.len()
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_size(self.entries.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.order.remove(key);
            self.stats.set_size(self.entries.len());
        }
        removed
    }
}
