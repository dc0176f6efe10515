//! Background Tasks Module
//!
//! # Tasks
//! - Cleanup: purges expired cache entries and lapsed limiter records

mod cleanup;

pub use cleanup::{purge_once, spawn_cleanup_task, PurgeReport};
