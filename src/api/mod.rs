//! API Module
//!
//! HTTP handlers and routing for the journal server.
//!
//! # Endpoints
//! - `POST /api/login` - Exchange credentials for a session cookie
//! - `POST /api/logout` - Clear the session cookie
//! - `GET /api/verify-session` - Report the current session, if any
//! - `/api/memories`, `/api/letters`, `/api/anniversaries` - Journal content
//! - `GET /api/cache/stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
