//! API Handlers
//!
//! HTTP request handlers for the session, journal and maintenance endpoints.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse},
    Extension, Json,
};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::auth::{
    clear_session_cookie, session_cookie, session_from_headers, CredentialVerifier, Session,
    TokenIssuer,
};
use crate::cache::{
    invalidate_anniversaries, invalidate_letters, invalidate_memories, shared_cache, CacheKeys,
    Memoize, SharedCache, TtlCache, MEMORIES_TTL,
};
use crate::config::{Config, ConfigError};
use crate::content::{
    client_address, is_spam, sanitize_content, validate_content_length, MAX_CONTENT_LENGTH,
};
use crate::error::{AppError, Result};
use crate::limiter::{
    ContentRateLimiter, LoginRateLimiter, SharedContentLimiter, SharedLoginLimiter,
};
use crate::models::requests::parse_date;
use crate::models::{
    CacheStatsResponse, CreateAnniversaryRequest, CreateLetterRequest, CreateMemoryRequest,
    HealthResponse, LoginRequest, MemoryView, SessionResponse, SuccessResponse,
};
use crate::store::{
    Anniversary, JournalStore, Letter, Memory, NewAnniversary, NewLetter, NewMemory,
};

/// Longest accepted title, in characters.
const MAX_TITLE_LENGTH: usize = 200;

/// Application state shared across all handlers.
///
/// Every mutable map sits behind its own lock; the verifier, issuer and
/// store are immutable and shared by reference count.
#[derive(Clone)]
pub struct AppState {
    /// Aggregate read cache, values stored as rendered JSON
    pub cache: SharedCache<Value>,
    pub login_limiter: SharedLoginLimiter,
    pub content_limiter: SharedContentLimiter,
    pub credentials: Arc<CredentialVerifier>,
    pub tokens: Arc<TokenIssuer>,
    pub store: Arc<dyn JournalStore>,
    /// Whether session cookies carry the Secure attribute
    pub cookie_secure: bool,
    /// Running with APP_ENV=production; hides upstream detail from logs
    pub production: bool,
}

impl AppState {
    /// Creates an AppState with fresh limiters.
    pub fn new(
        credentials: CredentialVerifier,
        tokens: TokenIssuer,
        store: Arc<dyn JournalStore>,
        cache: TtlCache<Value>,
    ) -> Self {
        Self {
            cache: shared_cache(cache),
            login_limiter: Arc::new(Mutex::new(LoginRateLimiter::new())),
            content_limiter: Arc::new(Mutex::new(ContentRateLimiter::new())),
            credentials: Arc::new(credentials),
            tokens: Arc::new(tokens),
            store,
            cookie_secure: false,
            production: false,
        }
    }

    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    /// Creates an AppState from configuration.
    ///
    /// # Arguments
    /// * `config` - Validated configuration
    /// * `store` - Backing journal store
    pub fn from_config(
        config: &Config,
        store: Arc<dyn JournalStore>,
    ) -> std::result::Result<Self, ConfigError> {
        let credentials = CredentialVerifier::new(&config.username, &config.password_hash)
            .map_err(|e| ConfigError::InvalidPasswordHash(e.to_string()))?;
        let tokens = TokenIssuer::new(config.session_secret.as_bytes(), config.session_ttl())
            .map_err(|_| ConfigError::Invalid {
                name: "SESSION_TTL_SECS",
                value: config.session_ttl.to_string(),
            })?;
        let cache = TtlCache::new(config.cache_max_entries, config.cache_default_ttl());

        Ok(Self::new(credentials, tokens, store, cache)
            .with_cookie_secure(config.cookie_secure)
            .with_production(config.production))
    }
}

// == Session ==

/// Handler for POST /api/login
///
/// The limiter is consulted before the credentials are looked at, so a
/// locked address is refused even with the right password.
pub async fn login_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let address = client_address(&headers);

    if !state.login_limiter.lock().await.check_allowed(&address) {
        warn!(address = %address, "login refused by rate limiter");
        return Err(AppError::RateLimited);
    }

    let (username, password) = req
        .credentials()
        .map(|(u, p)| (u.to_string(), p.to_string()))
        .ok_or_else(|| AppError::Validation("Username and password are required".to_string()))?;

    // Argon2 is CPU-bound; keep it off the async workers and outside any lock.
    let verifier = state.credentials.clone();
    let valid = tokio::task::spawn_blocking(move || verifier.verify(&username, &password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if !valid {
        let failures = state.login_limiter.lock().await.record_failure(&address);
        warn!(address = %address, failures, "failed login attempt");
        return Err(AppError::InvalidCredentials);
    }

    state.login_limiter.lock().await.clear_on_success(&address);

    let token = state
        .tokens
        .issue(state.credentials.username())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let cookie = session_cookie(&token, state.tokens.ttl().num_seconds(), state.cookie_secure);
    info!(address = %address, "login succeeded");

    Ok(([(header::SET_COOKIE, cookie)], Json(SuccessResponse::ok())))
}

/// Handler for POST /api/logout
pub async fn logout_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_session_cookie(state.cookie_secure))],
        Json(SuccessResponse::ok()),
    )
}

/// Handler for GET /api/verify-session
///
/// Always answers 200; an absent or invalid session is `{"session": null}`.
pub async fn verify_session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<SessionResponse> {
    Json(SessionResponse::from(session_from_headers(&state, &headers)))
}

// == Memories ==

/// Handler for GET /api/memories
pub async fn list_memories_handler(State(state): State<AppState>) -> Result<Json<Value>> {
    let store = state.store.clone();
    let value = memoized(&state, CacheKeys::memories(None), MEMORIES_TTL, move || {
        load_memories(store.clone())
    })
    .await?;
    Ok(Json(value))
}

/// Memories joined with their media. A failed media read degrades to an
/// empty list rather than failing the whole page.
async fn load_memories(store: Arc<dyn JournalStore>) -> Result<Vec<MemoryView>> {
    let memories = store.list_memories().await?;
    let mut views = Vec::with_capacity(memories.len());

    for memory in memories {
        let media = match store.list_media(&memory.id).await {
            Ok(media) => media,
            Err(e) => {
                warn!(memory_id = %memory.id, error = %e, "media read failed");
                Vec::new()
            }
        };
        views.push(MemoryView { memory, media });
    }
    Ok(views)
}

/// Handler for POST /api/memories
pub async fn create_memory_handler(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateMemoryRequest>,
) -> Result<Json<Memory>> {
    if let Some(error_msg) = req.validate() {
        return Err(AppError::Validation(error_msg));
    }

    let title = sanitize_content(req.title.as_deref().unwrap_or_default());
    let body = req
        .description
        .as_deref()
        .map(sanitize_content)
        .filter(|body| !body.is_empty());
    let taken_at = req
        .date
        .as_deref()
        .and_then(parse_date)
        .ok_or_else(|| AppError::Validation("Date must be YYYY-MM-DD".to_string()))?;
    check_title(&title)?;

    let memory = state
        .store
        .create_memory(NewMemory {
            title,
            body,
            taken_at,
            city_code: req.city_code.unwrap_or_default().trim().to_string(),
            album_id: req.album_id,
        })
        .await?;

    // The memory row is committed; drop cached views even if media fails.
    let media = if req.media.is_empty() {
        Ok(())
    } else {
        state.store.add_media(&memory.id, req.media).await.map(|_| ())
    };
    invalidate_memories(&state.cache).await;
    media?;

    info!(user = %session.username, memory_id = %memory.id, "memory created");
    Ok(Json(memory))
}

// == Letters ==

/// Handler for GET /api/letters
pub async fn list_letters_handler(State(state): State<AppState>) -> Result<Json<Value>> {
    let store = state.store.clone();
    let ttl = state.cache.read().await.default_ttl();
    let value = memoized(&state, CacheKeys::letters(), ttl, move || {
        let store = store.clone();
        async move { store.list_letters().await.map_err(AppError::from) }
    })
    .await?;
    Ok(Json(value))
}

/// Handler for POST /api/letters
pub async fn create_letter_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateLetterRequest>,
) -> Result<Json<Letter>> {
    let address = client_address(&headers);
    ensure_content_allowed(&state, &address).await?;

    if let Some(error_msg) = req.validate() {
        return Err(AppError::Validation(error_msg));
    }

    let title = sanitize_content(req.title.as_deref().unwrap_or_default());
    let body = sanitize_content(req.body.as_deref().unwrap_or_default());
    check_title(&title)?;
    if !validate_content_length(&body, MAX_CONTENT_LENGTH) {
        return Err(AppError::Validation("Body cannot be empty".to_string()));
    }
    if is_spam(&body) {
        return Err(spam_rejected(&address));
    }

    let letter = state.store.create_letter(NewLetter { title, body }).await?;

    state.content_limiter.lock().await.record_creation(&address);
    invalidate_letters(&state.cache).await;
    Ok(Json(letter))
}

/// Handler for DELETE /api/letters/:id
pub async fn delete_letter_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    state.store.delete_letter(&id).await?;
    invalidate_letters(&state.cache).await;
    Ok(Json(SuccessResponse::ok()))
}

// == Anniversaries ==

/// Handler for GET /api/anniversaries
pub async fn list_anniversaries_handler(State(state): State<AppState>) -> Result<Json<Value>> {
    let store = state.store.clone();
    let ttl = state.cache.read().await.default_ttl();
    let value = memoized(&state, CacheKeys::anniversaries(), ttl, move || {
        let store = store.clone();
        async move { store.list_anniversaries().await.map_err(AppError::from) }
    })
    .await?;
    Ok(Json(value))
}

/// Handler for POST /api/anniversaries
pub async fn create_anniversary_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateAnniversaryRequest>,
) -> Result<Json<Anniversary>> {
    let address = client_address(&headers);
    ensure_content_allowed(&state, &address).await?;

    if let Some(error_msg) = req.validate() {
        return Err(AppError::Validation(error_msg));
    }

    let title = sanitize_content(req.title.as_deref().unwrap_or_default());
    let date = req
        .date
        .as_deref()
        .and_then(parse_date)
        .ok_or_else(|| AppError::Validation("Date must be YYYY-MM-DD".to_string()))?;
    check_title(&title)?;
    if is_spam(&title) {
        return Err(spam_rejected(&address));
    }

    let anniversary = state
        .store
        .create_anniversary(NewAnniversary {
            title,
            date,
            repeat: req.repeat,
        })
        .await?;

    state.content_limiter.lock().await.record_creation(&address);
    invalidate_anniversaries(&state.cache).await;
    Ok(Json(anniversary))
}

// == Maintenance ==

/// Handler for GET /api/cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    let stats = state.cache.read().await.stats();
    Json(CacheStatsResponse::from(stats))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

// == Pages ==

/// Handler for GET /login
pub async fn login_page_handler() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

/// Handler for gated pages; the client app renders the journal itself.
pub async fn app_page_handler() -> Html<&'static str> {
    Html(APP_PAGE)
}

const LOGIN_PAGE: &str = r#"<!doctype html>
<html><head><meta charset="utf-8"><title>Sign in</title></head>
<body><main id="login"></main></body></html>
"#;

const APP_PAGE: &str = r#"<!doctype html>
<html><head><meta charset="utf-8"><title>Keepsake</title></head>
<body><main id="app"></main></body></html>
"#;

// == Helpers ==

/// Serves `key` from the cache, or runs `fetch` and caches its JSON.
async fn memoized<T, F, Fut>(
    state: &AppState,
    key: String,
    ttl: Duration,
    fetch: F,
) -> Result<Value>
where
    T: Serialize,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let fetch = &fetch;
    let memo = Memoize::new(
        state.cache.clone(),
        move |_: &()| key.clone(),
        ttl,
        move |_: ()| async move {
            let rows = fetch().await?;
            serde_json::to_value(rows).map_err(|e| AppError::Internal(e.to_string()))
        },
    );
    memo.call(()).await
}

async fn ensure_content_allowed(state: &AppState, address: &str) -> Result<()> {
    if state.content_limiter.lock().await.check_allowed(address) {
        Ok(())
    } else {
        warn!(address = %address, "content creation refused by rate limiter");
        Err(AppError::RateLimited)
    }
}

fn check_title(title: &str) -> Result<()> {
    if validate_content_length(title, MAX_TITLE_LENGTH) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Title must be between 1 and {MAX_TITLE_LENGTH} characters"
        )))
    }
}

fn spam_rejected(address: &str) -> AppError {
    warn!(address = %address, "content rejected as spam");
    AppError::Validation("Content appears to be spam".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password_with;
    use crate::cache::DEFAULT_TTL;
    use crate::store::InMemoryStore;
    use argon2::Params;
    use axum::http::HeaderValue;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn test_state() -> AppState {
        let hash = hash_password_with("hunter22", Params::new(1024, 1, 1, None).unwrap()).unwrap();
        AppState::new(
            CredentialVerifier::new("egesu", hash).unwrap(),
            TokenIssuer::new(SECRET, Duration::from_secs(8 * 3600)).unwrap(),
            Arc::new(InMemoryStore::new()),
            TtlCache::new(100, DEFAULT_TTL),
        )
    }

    fn from_address(address: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(address));
        headers
    }

    fn login(username: &str, password: &str) -> Json<LoginRequest> {
        Json(LoginRequest {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        })
    }

    #[tokio::test]
    async fn test_login_sets_cookie() {
        let state = test_state();
        let response = login_handler(State(state), from_address("10.0.0.1"), login("egesu", "hunter22"))
            .await
            .unwrap()
            .into_response();

        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("keepsake_session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=28800"));
    }

    #[tokio::test]
    async fn test_wrong_password_is_recorded() {
        let state = test_state();
        let result = login_handler(
            State(state.clone()),
            from_address("10.0.0.2"),
            login("egesu", "wrong"),
        )
        .await;

        assert!(matches!(result, Err(AppError::InvalidCredentials)));
        assert_eq!(state.login_limiter.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_password_is_validation_error() {
        let state = test_state();
        let req = Json(LoginRequest {
            username: Some("egesu".into()),
            password: None,
        });
        let result = login_handler(State(state.clone()), from_address("10.0.0.3"), req).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(state.login_limiter.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_letter_rejected_as_spam() {
        let state = test_state();
        let req = Json(CreateLetterRequest {
            title: Some("Deal".into()),
            body: Some("CLICK HERE NOW to buy https://spam.example/deal".into()),
        });
        let result = create_letter_handler(State(state.clone()), from_address("10.0.0.4"), req).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(state.content_limiter.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_letter_created_and_cache_invalidated() {
        let state = test_state();
        list_letters_handler(State(state.clone())).await.unwrap();
        assert!(state.cache.read().await.contains_key("letters:all"));

        let req = Json(CreateLetterRequest {
            title: Some("Hi".into()),
            body: Some("<b>dear you</b>".into()),
        });
        let letter = create_letter_handler(State(state.clone()), from_address("10.0.0.5"), req)
            .await
            .unwrap();

        assert_eq!(letter.body, "bdear you/b");
        assert!(!state.cache.read().await.contains_key("letters:all"));
        assert_eq!(state.content_limiter.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_anniversary_with_bad_date() {
        let state = test_state();
        let req = Json(CreateAnniversaryRequest {
            title: Some("First date".into()),
            date: Some("14/02/2019".into()),
            repeat: true,
        });
        let result =
            create_anniversary_handler(State(state), from_address("10.0.0.6"), req).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_unknown_letter_is_not_found() {
        let state = test_state();
        let result = delete_letter_handler(State(state), Path("missing".into())).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
