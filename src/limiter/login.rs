//! Login Rate Limiter
//!
//! Counts failed logins per client address. Only failures are recorded; a
//! successful login wipes the address's record.

use chrono::{DateTime, Utc};

use crate::limiter::{LimitPolicy, LimiterState, RateLimiter};

#[derive(Debug)]
pub struct LoginRateLimiter {
    inner: RateLimiter,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self::with_policy(LimitPolicy::login())
    }

    pub fn with_policy(policy: LimitPolicy) -> Self {
        Self {
            inner: RateLimiter::new("login", policy),
        }
    }

    pub fn check_allowed(&mut self, address: &str) -> bool {
        self.check_allowed_at(address, Utc::now())
    }

    pub fn check_allowed_at(&mut self, address: &str, now: DateTime<Utc>) -> bool {
        self.inner.check_allowed_at(address, now)
    }

    pub fn record_failure(&mut self, address: &str) -> u32 {
        self.record_failure_at(address, Utc::now())
    }

    pub fn record_failure_at(&mut self, address: &str, now: DateTime<Utc>) -> u32 {
        self.inner.record_at(address, now)
    }

    pub fn clear_on_success(&mut self, address: &str) {
        self.inner.clear(address);
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

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
