//! Cache Module
//!
//! In-process TTL cache used to memoise expensive aggregate reads from the
//! journal backend.

mod entry;
mod memoize;
mod order;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use entry::CacheEntry;
pub use memoize::{
    invalidate_anniversaries, invalidate_letters, invalidate_memories, CacheKeys, Memoize,
    MEMORIES_TTL,
};
pub use order::InsertionOrder;
pub use stats::CacheStats;
pub use store::TtlCache;

/// Cache handle shared between request handlers and the cleanup task.
pub type SharedCache<V> = Arc<RwLock<TtlCache<V>>>;

/// Wraps a cache for sharing across tasks.
pub fn shared_cache<V>(cache: TtlCache<V>) -> SharedCache<V> {
    Arc::new(RwLock::new(cache))
}

// == Public Constants ==
/// Default cache capacity
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Default entry freshness: five minutes
pub const DEFAULT_TTL: std::time::Duration = std::time::Duration::from_secs(5 * 60);
