//! Session Gates
//!
//! Two axum middlewares in front of the routers: API routes answer 401 when
//! the session cookie is missing or invalid, page routes redirect to the
//! login page instead.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::api::AppState;
use crate::auth::{token_from_headers, Session};
use crate::error::{AppError, Result};

/// Resolves the session carried by a request's cookies, if valid.
pub fn session_from_headers(state: &AppState, headers: &HeaderMap) -> Option<Session> {
    token_from_headers(headers).and_then(|token| state.tokens.verify(&token))
}

pub fn session_from_request(state: &AppState, request: &Request) -> Option<Session> {
    session_from_headers(state, request.headers())
}

/// Requires a valid session; the Session is stored in request extensions.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let session = session_from_request(&state, &request).ok_or(AppError::Unauthorized)?;
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Site-wide gate for pages: without a valid session, redirect to /login.
pub async fn require_page_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if request.uri().path() == "/login" {
        return next.run(request).await;
    }

    match session_from_request(&state, &request) {
        Some(_) => next.run(request).await,
        None => Redirect::to("/login").into_response(),
    }
}
