//! Keepsake - session and abuse-control core for a private memory journal
//!
//! Single-account login with Argon2 password hashes, stateless signed
//! session cookies, per-address rate limiting of logins and content
//! creation, and a TTL cache in front of the journal backend.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod limiter;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::Config;
pub use tasks::spawn_cleanup_task;
