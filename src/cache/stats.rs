//! Cache Statistics Module
//!
//! Hit, miss, expiry and eviction counters for the response cache.

use serde::Serialize;

// == Cache Stats ==
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Reads served from a fresh entry
    pub hits: u64,
    /// Reads that found nothing or a stale entry
    pub misses: u64,
    /// Stale entries dropped on read or by the purge task
    pub expirations: u64,
    /// Entries dropped to make room for a new key
    pub evictions: u64,
    /// Current number of entries
    pub size: usize,
    /// Configured capacity
    pub max_size: usize,
}

impl CacheStats {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            ..Self::default()
        }
    }

    // == Hit Rate ==
    /// hits / (hits + misses), or 0.0 before the first read.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn set_size(&mut self, size: usize) {
        self.size = size;
    }
}
