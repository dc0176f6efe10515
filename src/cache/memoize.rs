//! Read-through memoisation over the shared TTL cache, plus the cache keys
//! and invalidation helpers used by the journal handlers.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::cache::SharedCache;

/// Freshness of the memories aggregate.
pub const MEMORIES_TTL: Duration = Duration::from_secs(2 * 60);

// == Cache Keys ==
/// Key generators for cached aggregate views.
pub struct CacheKeys;

impl CacheKeys {
    pub fn memories(page: Option<u32>) -> String {
        match page {
            Some(page) => format!("memories:{page}"),
            None => "memories:all".to_string(),
        }
    }

    pub fn letters() -> String {
        "letters:all".to_string()
    }

    pub fn anniversaries() -> String {
        "anniversaries:all".to_string()
    }

    pub fn albums() -> String {
        "albums:all".to_string()
    }

    pub fn cities() -> String {
        "cities:visited".to_string()
    }
}

// == Memoize ==
/// Wraps an async fetch so that calls deriving the same key within the TTL
/// share one result.
///
/// Failed fetches are not cached. The cache lock is released while `fetch`
/// runs, so two concurrent misses on the same key may both fetch; the later
/// result wins. A result is discarded if the cache was invalidated while
/// its fetch was in flight.
pub struct Memoize<V, K, F> {
    cache: SharedCache<V>,
    key_fn: K,
    ttl: Duration,
    fetch: F,
}

impl<V, K, F> Memoize<V, K, F> {
    pub fn new(cache: SharedCache<V>, key_fn: K, ttl: Duration, fetch: F) -> Self {
        Self {
            cache,
            key_fn,
            ttl,
            fetch,
        }
    }

    /// Returns the cached value for `args`, fetching and storing it on a miss.
    pub async fn call<A, Fut, E>(&self, args: A) -> Result<V, E>
    where
        V: Clone,
        K: Fn(&A) -> String,
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let key = (self.key_fn)(&args);

        let generation = {
            let mut cache = self.cache.write().await;
            if let Some(value) = cache.get(&key) {
                debug!(key = %key, "cache hit");
                return Ok(value);
            }
            cache.generation()
        };
        debug!(key = %key, "cache miss");

        let value = (self.fetch)(args).await?;
        let stored = self
            .cache
            .write()
            .await
            .set_if_generation(key.as_str(), value.clone(), self.ttl, generation);
        if !stored {
            debug!(key = %key, "cache invalidated during fetch, result not stored");
        }

        Ok(value)
    }
}

// == Invalidation ==
/// Drops every view derived from memories.
pub async fn invalidate_memories<V: Clone>(cache: &SharedCache<V>) {
    let mut cache = cache.write().await;
    cache.delete(&CacheKeys::memories(None));
    cache.delete(&CacheKeys::cities());
    cache.delete(&CacheKeys::albums());
}

pub async fn invalidate_letters<V: Clone>(cache: &SharedCache<V>) {
    cache.write().await.delete(&CacheKeys::letters());
}

pub async fn invalidate_anniversaries<V: Clone>(cache: &SharedCache<V>) {
    cache.write().await.delete(&CacheKeys::anniversaries());
}
