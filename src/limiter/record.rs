//! Attempt Records
//!
//! Per-address counters kept by a rate limiter.

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Attempt Record ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptRecord {
    /// Attempts counted since the record was created
    pub count: u32,
    /// Time of the most recent attempt
    pub last_attempt_at: DateTime<Utc>,
    /// Set once `count` reaches the policy ceiling
    pub blocked: bool,
}

impl AttemptRecord {
    pub fn first(now: DateTime<Utc>) -> Self {
        Self {
            count: 1,
            last_attempt_at: now,
            blocked: false,
        }
    }

    /// Time elapsed since the last attempt.
    pub fn idle_for(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_attempt_at
    }
}

// == Limiter State ==
/// Observable state of one address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimiterState {
    /// No live record
    Clear,
    /// Some attempts, still under the window threshold
    Warming,
    /// Window threshold reached; lifts after the window of silence
    Locked,
    /// Ceiling reached; lifts only on explicit clear (or block expiry)
    Blocked,
}
