//! Auth Module
//!
//! Credential checks, stateless session tokens and the cookie that carries
//! them.

mod cookie;
mod credentials;
mod middleware;
mod token;

pub use cookie::{clear_session_cookie, session_cookie, token_from_headers, SESSION_COOKIE};
pub use credentials::{hash_password, hash_password_with, CredentialVerifier};
pub use middleware::{
    require_page_session, require_session, session_from_headers, session_from_request,
};
pub use token::{Session, SessionClaims, TokenError, TokenIssuer};
