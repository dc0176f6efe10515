//! Rate Limiter Store
//!
//! Map of attempt records keyed by client address, with the allow/deny state
//! machine shared by the login and content limiters. Every method is a
//! complete read-modify-write; callers wrap the limiter in a mutex so each
//! call is atomic with respect to other requests.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::limiter::{AttemptRecord, LimitPolicy, LimiterState};

// == Rate Limiter ==
#[derive(Debug)]
pub struct RateLimiter {
    /// Label used in log lines
    name: &'static str,
    policy: LimitPolicy,
    records: HashMap<String, AttemptRecord>,
}

impl RateLimiter {
    pub fn new(name: &'static str, policy: LimitPolicy) -> Self {
        Self {
            name,
            policy,
            records: HashMap::new(),
        }
    }

    // == Check Allowed ==
    /// Decides whether `key` may attempt again at `now`.
    ///
    /// - no record: allowed
    /// - blocked: denied, unless the policy's block expiry has passed
    /// - window of silence elapsed: record dropped, allowed
    /// - ceiling reached: record blocked, denied
    /// - otherwise allowed while under `max_attempts`
    pub fn check_allowed_at(&mut self, key: &str, now: DateTime<Utc>) -> bool {
        let Some(record) = self.records.get_mut(key) else {
            return true;
        };
        let idle = record.idle_for(now);

        if record.blocked {
            match self.policy.block_expiry {
                Some(expiry) if idle > expiry => {
                    self.records.remove(key);
                    return true;
                }
                _ => return false,
            }
        }

        if idle > self.policy.window {
            self.records.remove(key);
            return true;
        }

        if record.count >= self.policy.daily_ceiling {
            record.blocked = true;
            warn!(limiter = self.name, address = %key, "address blocked");
            return false;
        }

        let allowed = record.count < self.policy.max_attempts;
        if !allowed {
            warn!(limiter = self.name, address = %key, "attempt denied");
        }
        allowed
    }

    // == Record ==
    /// Counts one attempt for `key`; returns the new count.
    pub fn record_at(&mut self, key: &str, now: DateTime<Utc>) -> u32 {
        let record = self
            .records
            .entry(key.to_string())
            .and_modify(|record| {
                record.count += 1;
                record.last_attempt_at = now;
            })
            .or_insert_with(|| AttemptRecord::first(now));

        if record.count >= self.policy.daily_ceiling && !record.blocked {
            record.blocked = true;
            warn!(limiter = self.name, address = %key, count = record.count, "address blocked");
        }
        record.count
    }

    // == Clear ==
    /// Forgets `key` entirely; returns whether a record existed.
    pub fn clear(&mut self, key: &str) -> bool {
        self.records.remove(key).is_some()
    }

    // == State ==
    /// Reports the state `key` is in at `now` without mutating anything.
    pub fn state_at(&self, key: &str, now: DateTime<Utc>) -> LimiterState {
        let Some(record) = self.records.get(key) else {
            return LimiterState::Clear;
        };
        let idle = record.idle_for(now);

        if record.blocked {
            return match self.policy.block_expiry {
                Some(expiry) if idle > expiry => LimiterState::Clear,
                _ => LimiterState::Blocked,
            };
        }
        if idle > self.policy.window {
            LimiterState::Clear
        } else if record.count >= self.policy.max_attempts {
            LimiterState::Locked
        } else {
            LimiterState::Warming
        }
    }

    pub fn record(&self, key: &str) -> Option<&AttemptRecord> {
        self.records.get(key)
    }

    // == Purge Stale ==
    /// Drops records whose state has lapsed back to Clear at `now`.
    pub fn purge_stale_at(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.records.len();
        let window = self.policy.window;
        let block_expiry = self.policy.block_expiry;

        self.records.retain(|_, record| {
            let idle = record.idle_for(now);
            if record.blocked {
                block_expiry.map_or(true, |expiry| idle <= expiry)
            } else {
                idle <= window
            }
        });

        before - self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn policy() -> LimitPolicy {
        LimitPolicy {
            max_attempts: 3,
            window: Duration::minutes(30),
            daily_ceiling: 10,
            block_expiry: None,
        }
    }

    #[test]
    fn test_unknown_address_allowed() {
        let mut limiter = RateLimiter::new("test", policy());
        assert!(limiter.check_allowed_at("10.0.0.1", Utc::now()));
        assert!(limiter.is_empty());
    }

    #[test]
    fn test_state_progression() {
        let mut limiter = RateLimiter::new("test", policy());
        let now = Utc::now();

        assert_eq!(limiter.state_at("a", now), LimiterState::Clear);
        limiter.record_at("a", now);
        assert_eq!(limiter.state_at("a", now), LimiterState::Warming);
        limiter.record_at("a", now);
        limiter.record_at("a", now);
        assert_eq!(limiter.state_at("a", now), LimiterState::Locked);
        assert_eq!(
            limiter.state_at("a", now + Duration::minutes(31)),
            LimiterState::Clear
        );
    }

    #[test]
    fn test_window_measured_from_last_attempt() {
        let mut limiter = RateLimiter::new("test", policy());
        let start = Utc::now();

        limiter.record_at("a", start);
        limiter.record_at("a", start + Duration::minutes(20));
        limiter.record_at("a", start + Duration::minutes(40));

        // 50 minutes after the first failure, but only 10 after the last
        assert!(!limiter.check_allowed_at("a", start + Duration::minutes(50)));
        assert!(limiter.check_allowed_at("a", start + Duration::minutes(71)));
        assert!(limiter.record("a").is_none());
    }

    #[test]
    fn test_record_sets_blocked_at_ceiling() {
        let mut limiter = RateLimiter::new("test", policy());
        let now = Utc::now();

        for _ in 0..9 {
            limiter.record_at("a", now);
        }
        assert!(!limiter.record("a").unwrap().blocked);

        assert_eq!(limiter.record_at("a", now), 10);
        assert!(limiter.record("a").unwrap().blocked);
    }

    #[test]
    fn test_block_expiry_lifts_block() {
        let mut limiter = RateLimiter::new(
            "test",
            LimitPolicy {
                block_expiry: Some(Duration::hours(24)),
                ..policy()
            },
        );
        let now = Utc::now();
        for _ in 0..10 {
            limiter.record_at("a", now);
        }

        assert!(!limiter.check_allowed_at("a", now + Duration::hours(23)));
        assert!(limiter.check_allowed_at("a", now + Duration::hours(25)));
        assert!(limiter.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut limiter = RateLimiter::new("test", policy());
        limiter.record_at("a", Utc::now());

        assert!(limiter.clear("a"));
        assert!(!limiter.clear("a"));
    }

    #[test]
    fn test_purge_keeps_blocked_and_live_records() {
        let mut limiter = RateLimiter::new("test", policy());
        let start = Utc::now();

        limiter.record_at("stale", start);
        limiter.record_at("live", start + Duration::minutes(50));
        for _ in 0..10 {
            limiter.record_at("blocked", start);
        }

        let removed = limiter.purge_stale_at(start + Duration::minutes(60));
        assert_eq!(removed, 1);
        assert!(limiter.record("stale").is_none());
        assert!(limiter.record("live").is_some());
        assert!(limiter.record("blocked").is_some());
    }
}
