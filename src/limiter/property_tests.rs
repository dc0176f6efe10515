//! Property-Based Tests for Limiter Module

use chrono::{Duration, Utc};
use proptest::prelude::*;

use crate::limiter::{LimitPolicy, LimiterState, RateLimiter};

fn policy_strategy() -> impl Strategy<Value = LimitPolicy> {
    (1u32..10, 1i64..120, 0u32..20).prop_map(|(max_attempts, window_mins, headroom)| LimitPolicy {
        max_attempts,
        window: Duration::minutes(window_mins),
        daily_ceiling: max_attempts + headroom + 1,
        block_expiry: None,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Exactly max_attempts recorded failures inside the window deny the
    // address; one fewer does not.
    #[test]
    fn prop_denied_at_threshold(policy in policy_strategy()) {
        let mut limiter = RateLimiter::new("prop", policy.clone());
        let now = Utc::now();

        for _ in 0..policy.max_attempts - 1 {
            limiter.record_at("addr", now);
        }
        prop_assert!(limiter.check_allowed_at("addr", now));

        limiter.record_at("addr", now);
        prop_assert!(!limiter.check_allowed_at("addr", now));
    }

    // After a full window of silence an unblocked address is allowed and
    // its record is gone.
    #[test]
    fn prop_window_of_silence_resets(
        policy in policy_strategy(),
        failures in 1u32..40,
        overshoot_secs in 1i64..3600,
    ) {
        let mut limiter = RateLimiter::new("prop", policy.clone());
        let now = Utc::now();
        let failures = failures.min(policy.daily_ceiling - 1);

        for _ in 0..failures {
            limiter.record_at("addr", now);
        }

        let later = now + policy.window + Duration::seconds(overshoot_secs);
        prop_assert!(limiter.check_allowed_at("addr", later));
        prop_assert!(limiter.record("addr").is_none());
    }

    // Reaching the ceiling blocks regardless of elapsed time, until cleared.
    #[test]
    fn prop_ceiling_blocks_until_cleared(
        policy in policy_strategy(),
        wait_hours in 0i64..24 * 30,
    ) {
        let mut limiter = RateLimiter::new("prop", policy.clone());
        let now = Utc::now();

        for _ in 0..policy.daily_ceiling {
            limiter.record_at("addr", now);
        }

        let later = now + Duration::hours(wait_hours);
        prop_assert!(!limiter.check_allowed_at("addr", later));
        prop_assert_eq!(limiter.state_at("addr", later), LimiterState::Blocked);

        limiter.clear("addr");
        prop_assert!(limiter.check_allowed_at("addr", later));
    }
}
