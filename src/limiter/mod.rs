//! Limiter Module
//!
//! Per-address attempt counting for login abuse and content spam.

mod content;
mod login;
mod policy;
mod record;
mod store;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;

use tokio::sync::Mutex;

pub use content::ContentRateLimiter;
pub use login::LoginRateLimiter;
pub use policy::{
    LimitPolicy, CONTENT_MAX_DAILY, CONTENT_MAX_PER_HOUR, LOGIN_MAX_ATTEMPTS,
    LOGIN_MAX_DAILY_ATTEMPTS,
};
pub use record::{AttemptRecord, LimiterState};
pub use store::RateLimiter;

/// Login limiter shared between handlers and the cleanup task.
pub type SharedLoginLimiter = Arc<Mutex<LoginRateLimiter>>;

/// Content limiter shared between handlers and the cleanup task.
pub type SharedContentLimiter = Arc<Mutex<ContentRateLimiter>>;
