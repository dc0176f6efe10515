//! Limiter Policies
//!
//! Thresholds and windows for the two rate limiters.

use chrono::Duration;

/// Failed logins allowed inside one window before the address is locked.
pub const LOGIN_MAX_ATTEMPTS: u32 = 3;
/// Failed logins after which the address is blocked until a successful login.
pub const LOGIN_MAX_DAILY_ATTEMPTS: u32 = 10;

/// Content creations allowed inside one window.
pub const CONTENT_MAX_PER_HOUR: u32 = 20;
/// Content creations after which the address is blocked.
pub const CONTENT_MAX_DAILY: u32 = 100;

// == Limit Policy ==
/// How a limiter counts and when it denies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitPolicy {
    /// Denies once this many attempts fall inside one window
    pub max_attempts: u32,
    /// Silence after the last attempt that resets the record
    pub window: Duration,
    /// Attempts after which the record is blocked
    pub daily_ceiling: u32,
    /// Silence after which a blocked record is dropped; None = never
    pub block_expiry: Option<Duration>,
}

impl LimitPolicy {
    /// 3 failures per 30 minutes, blocked after 10 until a successful login.
    pub fn login() -> Self {
        Self {
            max_attempts: LOGIN_MAX_ATTEMPTS,
            window: Duration::minutes(30),
            daily_ceiling: LOGIN_MAX_DAILY_ATTEMPTS,
            block_expiry: None,
        }
    }

    /// 20 creations per hour, blocked after 100; blocks lift after a day of
    /// silence.
    pub fn content() -> Self {
        Self {
            max_attempts: CONTENT_MAX_PER_HOUR,
            window: Duration::hours(1),
            daily_ceiling: CONTENT_MAX_DAILY,
            block_expiry: Some(Duration::hours(24)),
        }
    }
}
