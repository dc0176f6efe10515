//! Session Tokens
//!
//! Compact HS256 tokens (`header.claims.signature`, base64url without
//! padding) asserting that the bearer is logged in as an account until an
//! expiry time. Nothing is stored server-side: a token is valid exactly when
//! its MAC checks out and it has not expired.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

// == Token Error ==
/// Why a token was rejected. Never surfaced past the verifier.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("token does not have three segments")]
    Malformed,
    #[error("token segment is not valid base64url")]
    Encoding,
    #[error("token segment is not valid JSON")]
    Json,
    #[error("unsupported algorithm")]
    Algorithm,
    #[error("signature mismatch")]
    Signature,
    #[error("token does not assert a logged-in identity")]
    Claims,
    #[error("token expired")]
    Expired,
    #[error("signing key rejected")]
    Key,
    #[error("session lifetime out of range")]
    Lifetime,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Claims carried inside a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Account name
    pub sub: String,
    #[serde(rename = "isLoggedIn")]
    pub is_logged_in: bool,
    /// Random per-session identifier
    pub sid: String,
    /// Issued at, unix seconds
    pub iat: i64,
    /// Expires at, unix seconds
    pub exp: i64,
}

/// A verified session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub username: String,
    pub is_logged_in: bool,
    pub session_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// == Token Issuer ==
/// Mints and verifies session tokens with a server-only key.
#[derive(Clone)]
pub struct TokenIssuer {
    key: Vec<u8>,
    ttl: chrono::Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Creates an issuer; a zero or unrepresentable lifetime is rejected.
    pub fn new(secret: impl AsRef<[u8]>, ttl: std::time::Duration) -> Result<Self, TokenError> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|_| TokenError::Lifetime)?;
        if ttl <= chrono::Duration::zero() {
            return Err(TokenError::Lifetime);
        }
        Ok(Self {
            key: secret.as_ref().to_vec(),
            ttl,
        })
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    // == Issue ==
    pub fn issue(&self, identity: &str) -> Result<String, TokenError> {
        self.issue_at(identity, Utc::now())
    }

    pub fn issue_at(&self, identity: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };
        let claims = SessionClaims {
            sub: identity.to_string(),
            is_logged_in: true,
            sid: Uuid::new_v4().simple().to_string(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(self.ttl)
                .ok_or(TokenError::Lifetime)?
                .timestamp(),
        };

        let signing_input = format!(
            "{}.{}",
            encode_json(&header)?,
            encode_json(&claims)?
        );
        let signature = self.mac(signing_input.as_bytes())?.finalize().into_bytes();

        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    // == Verify ==
    /// Returns the session a token asserts, or None for any defect.
    pub fn verify(&self, token: &str) -> Option<Session> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Option<Session> {
        match self.decode(token, now) {
            Ok(session) => Some(session),
            Err(e) => {
                debug!(reason = %e, "session token rejected");
                None
            }
        }
    }

    fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<Session, TokenError> {
        let mut segments = token.split('.');
        let (Some(header), Some(claims), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::Malformed);
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Encoding)?;
        let mut mac = self.mac(header.as_bytes())?;
        mac.update(b".");
        mac.update(claims.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::Signature)?;

        let header: Header = decode_json(header)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::Algorithm);
        }

        let claims: SessionClaims = decode_json(claims)?;
        if !claims.is_logged_in || claims.sub.is_empty() {
            return Err(TokenError::Claims);
        }
        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(TokenError::Claims)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::Claims)?;

        Ok(Session {
            username: claims.sub,
            is_logged_in: true,
            session_id: claims.sid,
            issued_at,
            expires_at,
        })
    }

    fn mac(&self, data: &[u8]) -> Result<HmacSha256, TokenError> {
        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|_| TokenError::Key)?;
        mac.update(data);
        Ok(mac)
    }
}

fn encode_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let bytes = serde_json::to_vec(value).map_err(|_| TokenError::Json)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

fn decode_json<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Encoding)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Json)
}
