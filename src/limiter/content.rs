//! Content Rate Limiter
//!
//! Counts accepted content creations (letters, anniversaries) per client
//! address. Unlike the login limiter this measures usage, so every accepted
//! creation is recorded and nothing clears a record early.

use chrono::{DateTime, Utc};

use crate::limiter::{LimitPolicy, LimiterState, RateLimiter};

#[derive(Debug)]
pub struct ContentRateLimiter {
    inner: RateLimiter,
}

impl ContentRateLimiter {
    pub fn new() -> Self {
        Self::with_policy(LimitPolicy::content())
    }

    pub fn with_policy(policy: LimitPolicy) -> Self {
        Self {
            inner: RateLimiter::new("content", policy),
        }
    }

    pub fn check_allowed(&mut self, address: &str) -> bool {
        self.check_allowed_at(address, Utc::now())
    }

    pub fn check_allowed_at(&mut self, address: &str, now: DateTime<Utc>) -> bool {
        self.inner.check_allowed_at(address, now)
    }

    pub fn record_creation(&mut self, address: &str) -> u32 {
        self.record_creation_at(address, Utc::now())
    }

    pub fn record_creation_at(&mut self, address: &str, now: DateTime<Utc>) -> u32 {
        self.inner.record_at(address, now)
    }

    pub fn state_at(&self, address: &str, now: DateTime<Utc>) -> LimiterState {
        self.inner.state_at(address, now)
    }

    pub fn purge_stale(&mut self) -> usize {
        self.inner.purge_stale_at(Utc::now())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for ContentRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
