//! Error types for the journal server
//!
//! Provides unified error handling using thiserror. Every variant maps to a
//! single HTTP status and a deliberately generic message: callers never learn
//! whether a username exists, why a token was rejected, or how much quota is
//! left. Upstream detail never reaches a response body; it rides along in
//! the response extensions and is logged by [`report_error_details`].

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

// == App Error Enum ==
/// Unified error type for the journal server.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing, invalid or expired session token
    #[error("Unauthorized")]
    Unauthorized,

    /// Submitted credentials did not match the configured account
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Login or content creation denied by a rate limiter
    #[error("Too many requests. Please try again later.")]
    RateLimited,

    /// Missing fields, spam or over-long content
    #[error("{0}")]
    Validation(String),

    /// Referenced record does not exist
    #[error("{0}")]
    NotFound(String),

    /// Backing data store failed
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(what),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

/// Detail of a 500 response, kept out of the body.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, detail) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string(), None),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string(), None),
            AppError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, self.to_string(), None),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Upstream(detail) | AppError::Internal(detail) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                Some(ErrorDetail(detail.clone())),
            ),
        };

        let mut response = (status, Json(json!({ "error": message }))).into_response();
        if let Some(detail) = detail {
            response.extensions_mut().insert(detail);
        }
        response
    }
}

// == Error Reporting ==
/// Logs failed requests. Upstream detail is logged only outside production;
/// the state is `Config::production`.
pub async fn report_error_details(
    State(production): State<bool>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    if let Some(ErrorDetail(detail)) = response.extensions_mut().remove::<ErrorDetail>() {
        if production {
            error!(path = %path, status = %response.status(), "request failed");
        } else {
            error!(path = %path, status = %response.status(), error = %detail, "request failed");
        }
    }
    response
}

// == Result Type Alias ==
/// Convenience Result type for the journal server.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::InvalidCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::RateLimited.into_response().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::Validation("Title is required".into())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Upstream("connection refused".into())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_upstream_detail_stays_out_of_body() {
        let response = AppError::Upstream("connection refused to 10.0.0.9".into()).into_response();

        assert_eq!(
            response.extensions().get::<ErrorDetail>().map(|d| d.0.as_str()),
            Some("connection refused to 10.0.0.9")
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_report_error_details_consumes_detail() {
        use axum::{body::Body, http::Request, middleware, routing::get, Router};
        use tower::util::ServiceExt;

        for production in [true, false] {
            let app = Router::new()
                .route(
                    "/fail",
                    get(|| async { AppError::Internal("pool exhausted".into()) }),
                )
                .layer(middleware::from_fn_with_state(production, report_error_details));

            let response = app
                .oneshot(Request::builder().uri("/fail").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert!(response.extensions().get::<ErrorDetail>().is_none());
        }
    }

    #[test]
    fn test_store_not_found_maps_to_404() {
        let err: AppError = StoreError::NotFound("Letter not found".into()).into();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
