//! Session Cookie
//!
//! The signed token travels only in an HttpOnly cookie; it is never handed
//! to scripts or returned in a response body.

use axum::http::{header, HeaderMap};
use cookie::time::Duration;
use cookie::{Cookie, SameSite};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "keepsake_session";

/// Builds the Set-Cookie value carrying a freshly issued token.
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(max_age_secs))
        .secure(secure)
        .build()
        .to_string()
}

/// Builds the Set-Cookie value that removes the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

/// Extracts the session token from the request's Cookie headers.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value_trimmed().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn parsed(set_cookie: &str) -> Cookie<'static> {
        Cookie::parse(set_cookie.to_string()).unwrap()
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = parsed(&session_cookie("abc.def.ghi", 28_800, true));

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc.def.ghi");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(28_800)));
        assert_eq!(cookie.secure(), Some(true));
    }

    #[test]
    fn test_insecure_cookie_for_local_development() {
        assert!(!session_cookie("t", 10, false).contains("Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = parsed(&clear_session_cookie(false));
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }

    #[test]
    fn test_token_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=rose; keepsake_session=tok.en.sig; other=1"),
        );

        assert_eq!(token_from_headers(&headers), Some("tok.en.sig".to_string()));
    }

    #[test]
    fn test_token_from_multiple_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=rose"));
        headers.append(header::COOKIE, HeaderValue::from_static("keepsake_session=t"));

        assert_eq!(token_from_headers(&headers), Some("t".to_string()));
    }

    #[test]
    fn test_quoted_cookie_value_is_unquoted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static(r#"keepsake_session="tok.en.sig""#),
        );

        assert_eq!(token_from_headers(&headers), Some("tok.en.sig".to_string()));
    }

    #[test]
    fn test_missing_or_empty_cookie() {
        let mut headers = HeaderMap::new();
        assert_eq!(token_from_headers(&headers), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("keepsake_session="));
        assert_eq!(token_from_headers(&headers), None);
    }
}
