//! API Routes
//!
//! Configures the Axum router: open session endpoints, the session-gated
//! journal API, and the page routes behind the login redirect.

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    app_page_handler, cache_stats_handler, create_anniversary_handler, create_letter_handler,
    create_memory_handler, delete_letter_handler, health_handler, list_anniversaries_handler,
    list_letters_handler, list_memories_handler, login_handler, login_page_handler,
    logout_handler, verify_session_handler, AppState,
};
use crate::auth::{require_page_session, require_session};
use crate::error::report_error_details;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /api/login`, `POST /api/logout`, `GET /api/verify-session`
/// - `GET|POST /api/memories` (session)
/// - `GET|POST /api/letters`, `DELETE /api/letters/:id` (session)
/// - `GET|POST /api/anniversaries` (session)
/// - `GET /api/cache/stats` (session)
/// - `GET /health`
/// - `GET /login`, and every other path as a gated page
///
/// # Middleware
/// - Session gate: 401 on the journal API, redirect to /login on pages
/// - Error reporting: upstream detail logged outside production only
/// - CORS
/// - Tracing: logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let journal = Router::new()
        .route(
            "/api/memories",
            get(list_memories_handler).post(create_memory_handler),
        )
        .route(
            "/api/letters",
            get(list_letters_handler).post(create_letter_handler),
        )
        .route("/api/letters/:id", delete(delete_letter_handler))
        .route(
            "/api/anniversaries",
            get(list_anniversaries_handler).post(create_anniversary_handler),
        )
        .route("/api/cache/stats", get(cache_stats_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    let pages = Router::new()
        .route("/", get(app_page_handler))
        .route("/login", get(login_page_handler))
        .fallback(app_page_handler)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_page_session,
        ));

    Router::new()
        .route("/api/login", post(login_handler))
        .route("/api/logout", post(logout_handler))
        .route("/api/verify-session", get(verify_session_handler))
        .route("/health", get(health_handler))
        .merge(journal)
        .merge(pages)
        .layer(middleware::from_fn_with_state(
            state.production,
            report_error_details,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
