//! Retry with exponential backoff for transient backend reads.
//!
//! Only reads go through here. Writes are never repeated, and nothing in
//! the auth or rate-limit path is retried.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::store::StoreResult;

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Runs `op` up to `max_attempts` times, sleeping `base_delay * 2^(n-1)`
/// after the n-th transient failure.
pub async fn with_retry<T, F, Fut>(
    max_attempts: u32,
    base_delay: Duration,
    mut op: F,
) -> StoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts && e.is_transient() => {
                let delay = base_delay * 2u32.pow(attempt - 1);
                warn!(attempt, error = %e, ?delay, "backend read failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
