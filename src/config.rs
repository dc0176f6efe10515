//! Configuration Module
//!
//! Loads server configuration from environment variables. Secrets have no
//! fallback values: a missing or malformed secret aborts startup.

use std::env;
use std::time::Duration;

use argon2::PasswordHash;
use thiserror::Error;

/// Minimum accepted length of the session signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Default session lifetime: 8 hours.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 8 * 60 * 60;

/// Longest accepted session lifetime: 30 days.
pub const MAX_SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;

// == Config Error ==
/// Reasons the configuration could not be loaded.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("SESSION_SECRET must be at least {} bytes", MIN_SECRET_LEN)]
    WeakSecret,

    #[error("APP_PASSWORD_HASH is not a valid PHC hash string: {0}")]
    InvalidPasswordHash(String),

    #[error("environment variable {name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Server configuration parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// Symmetric key used to sign session tokens
    pub session_secret: String,
    /// The single configured account name
    pub username: String,
    /// Argon2 PHC string of the account password
    pub password_hash: String,
    /// HTTP server port
    pub server_port: u16,
    /// Session token lifetime in seconds
    pub session_ttl: u64,
    /// Maximum number of entries the response cache can hold
    pub cache_max_entries: usize,
    /// Default cache TTL in seconds
    pub cache_default_ttl: u64,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Running with APP_ENV=production
    pub production: bool,
    /// Whether the session cookie carries the Secure attribute
    pub cookie_secure: bool,
    /// Base URL of the hosted backend (PostgREST)
    pub backend_url: Option<String>,
    /// API key of the hosted backend
    pub backend_api_key: Option<String>,
}

impl Config {
    /// Creates a Config with the given secrets and default tunables.
    pub fn new(
        session_secret: impl Into<String>,
        username: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            session_secret: session_secret.into(),
            username: username.into(),
            password_hash: password_hash.into(),
            server_port: 3000,
            session_ttl: DEFAULT_SESSION_TTL_SECS,
            cache_max_entries: 100,
            cache_default_ttl: 300,
            cleanup_interval: 60,
            production: false,
            cookie_secure: false,
            backend_url: None,
            backend_api_key: None,
        }
    }

    /// Loads the configuration from process environment variables.
    ///
    /// # Environment Variables
    /// - `SESSION_SECRET` - token signing key, at least 32 bytes (required)
    /// - `APP_USERNAME` - account name (required)
    /// - `APP_PASSWORD_HASH` - Argon2 PHC hash (required)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SESSION_TTL_SECS` - session lifetime, 1s to 30 days (default: 28800)
    /// - `CACHE_MAX_ENTRIES` - cache capacity (default: 100)
    /// - `CACHE_DEFAULT_TTL` - cache TTL in seconds (default: 300)
    /// - `CLEANUP_INTERVAL` - cleanup frequency in seconds (default: 60)
    /// - `APP_ENV` - `production` enables production behaviour
    /// - `COOKIE_SECURE` - overrides the Secure cookie attribute
    /// - `BACKEND_URL` / `BACKEND_API_KEY` - hosted backend location
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let session_secret = required("SESSION_SECRET")?;
        if session_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret);
        }
        let username = required("APP_USERNAME")?;
        let password_hash = required("APP_PASSWORD_HASH")?;
        PasswordHash::new(&password_hash)
            .map_err(|e| ConfigError::InvalidPasswordHash(e.to_string()))?;

        let mut config = Self::new(session_secret, username, password_hash);

        config.server_port = parse_or(&lookup, "SERVER_PORT", config.server_port)?;
        config.session_ttl = parse_or(&lookup, "SESSION_TTL_SECS", config.session_ttl)?;
        if config.session_ttl == 0 || config.session_ttl > MAX_SESSION_TTL_SECS {
            return Err(ConfigError::Invalid {
                name: "SESSION_TTL_SECS",
                value: config.session_ttl.to_string(),
            });
        }
        config.cache_max_entries =
            parse_or(&lookup, "CACHE_MAX_ENTRIES", config.cache_max_entries)?;
        config.cache_default_ttl =
            parse_or(&lookup, "CACHE_DEFAULT_TTL", config.cache_default_ttl)?;
        config.cleanup_interval = parse_or(&lookup, "CLEANUP_INTERVAL", config.cleanup_interval)?;

        config.production = lookup("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production"));
        config.cookie_secure = parse_or(&lookup, "COOKIE_SECURE", config.production)?;

        config.backend_url = lookup("BACKEND_URL").filter(|v| !v.is_empty());
        config.backend_api_key = lookup("BACKEND_API_KEY").filter(|v| !v.is_empty());

        Ok(config)
    }

    /// Session lifetime as a Duration.
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl)
    }

    /// Default cache TTL as a Duration.
    pub fn cache_default_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_default_ttl)
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => {
            value.trim().parse().map_err(|_| ConfigError::Invalid { name, value })
        }
        _ => Ok(default),
    }
}
