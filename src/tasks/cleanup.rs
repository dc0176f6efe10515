//! Cleanup Task
//!
//! Background task that periodically drops expired cache entries and limiter
//! records whose window has lapsed. Reads already treat both as absent; the
//! purge only bounds memory.

use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;
use crate::limiter::{SharedContentLimiter, SharedLoginLimiter};

/// Counts removed by one purge pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PurgeReport {
    pub cache_entries: usize,
    pub login_records: usize,
    pub content_records: usize,
}

impl PurgeReport {
    pub fn total(&self) -> usize {
        self.cache_entries + self.login_records + self.content_records
    }
}

/// Runs one purge pass, taking each lock in turn.
pub async fn purge_once(
    cache: &SharedCache<Value>,
    login_limiter: &SharedLoginLimiter,
    content_limiter: &SharedContentLimiter,
) -> PurgeReport {
    PurgeReport {
        cache_entries: cache.write().await.purge_expired(),
        login_records: login_limiter.lock().await.purge_stale(),
        content_records: content_limiter.lock().await.purge_stale(),
    }
}

/// Spawns a background task that purges expired state every interval.
///
/// # Arguments
/// * `cache` - Shared aggregate cache
/// * `login_limiter` - Shared login limiter
/// * `content_limiter` - Shared content limiter
/// * `cleanup_interval_secs` - Interval in seconds between purge runs
///
/// # Returns
/// A JoinHandle for the spawned task, aborted during graceful shutdown.
pub fn spawn_cleanup_task(
    cache: SharedCache<Value>,
    login_limiter: SharedLoginLimiter,
    content_limiter: SharedContentLimiter,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting cleanup task with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let report = purge_once(&cache, &login_limiter, &content_limiter).await;

            if report.total() > 0 {
                info!(
                    cache_entries = report.cache_entries,
                    login_records = report.login_records,
                    content_records = report.content_records,
                    "cleanup removed expired state"
                );
            } else {
                debug!("cleanup: nothing expired");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use tokio::sync::Mutex;

    use crate::cache::{shared_cache, TtlCache};
    use crate::limiter::{ContentRateLimiter, LoginRateLimiter};

    fn shared_state() -> (SharedCache<Value>, SharedLoginLimiter, SharedContentLimiter) {
        (
            shared_cache(TtlCache::new(100, Duration::from_secs(300))),
            Arc::new(Mutex::new(LoginRateLimiter::new())),
            Arc::new(Mutex::new(ContentRateLimiter::new())),
        )
    }

    #[tokio::test]
    async fn test_purge_removes_expired_entries() {
        let (cache, login, content) = shared_state();
        {
            let mut guard = cache.write().await;
            guard.set_with_ttl("expire_soon", Value::from(1), Duration::from_millis(20));
            guard.set("long_lived", Value::from(2));
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        let report = purge_once(&cache, &login, &content).await;

        assert_eq!(report.cache_entries, 1);
        assert!(cache.read().await.contains_key("long_lived"));
    }

    #[tokio::test]
    async fn test_purge_drops_lapsed_limiter_records() {
        let (cache, login, content) = shared_state();
        let long_ago = Utc::now() - chrono::Duration::hours(2);
        login.lock().await.record_failure_at("10.0.0.1", long_ago);
        login.lock().await.record_failure("10.0.0.2");
        content.lock().await.record_creation_at("10.0.0.3", long_ago);

        let report = purge_once(&cache, &login, &content).await;

        assert_eq!(report.login_records, 1);
        assert_eq!(report.content_records, 1);
        assert_eq!(login.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let (cache, login, content) = shared_state();
        let handle = spawn_cleanup_task(cache, login, content, 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
