//! Cache Entry Module
//!
//! A single memoised value together with the moment it was stored and how
//! long it stays fresh.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A stored value plus its freshness metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// When the value was stored
    pub stored_at: Instant,
    /// How long the value stays fresh
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    /// Creates an entry stored at an explicit instant.
    pub fn stored_at(value: V, ttl: Duration, stored_at: Instant) -> Self {
        Self {
            value,
            stored_at,
            ttl,
        }
    }

    // == Is Expired ==
    /// An entry is stale once its age strictly exceeds its TTL.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) > self.ttl
    }
}
