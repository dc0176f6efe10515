//! Content Protection
//!
//! Client address resolution, free-text sanitising and a heuristic spam
//! score for the content-creation endpoints.

use axum::http::HeaderMap;
use once_cell::sync::Lazy;
use regex::Regex;

/// Longest accepted free-text field, in characters.
pub const MAX_CONTENT_LENGTH: usize = 5000;

/// Scores above this are treated as spam.
pub const SPAM_THRESHOLD: usize = 3;

/// Address used when no proxy header identifies the client.
pub const UNKNOWN_ADDRESS: &str = "unknown";

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());
static MENTION_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\w+").unwrap());
static KEYWORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(buy|sell|free|click|here|now)\b").unwrap());
static CAPS_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]{5,}").unwrap());

/// Run length at which a repeated character counts towards the spam score.
const REPEAT_RUN: usize = 5;

// == Client Address ==
/// Best-effort originating address: first `x-forwarded-for` hop, then
/// `x-real-ip`, then `"unknown"`.
pub fn client_address(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned)
    };

    header("x-forwarded-for")
        .or_else(|| header("x-real-ip"))
        .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string())
}

// == Sanitise ==
/// Trims, strips angle brackets and truncates to [`MAX_CONTENT_LENGTH`].
pub fn sanitize_content(content: &str) -> String {
    content
        .trim()
        .chars()
        .filter(|c| *c != '<' && *c != '>')
        .take(MAX_CONTENT_LENGTH)
        .collect()
}

/// Non-blank and at most `max_length` characters.
pub fn validate_content_length(content: &str, max_length: usize) -> bool {
    !content.trim().is_empty() && content.chars().count() <= max_length
}

// == Spam Score ==
/// Sums URL, mention, keyword, shouting and repeated-character matches.
pub fn spam_score(content: &str) -> usize {
    URL_PATTERN.find_iter(content).count()
        + MENTION_PATTERN.find_iter(content).count()
        + KEYWORD_PATTERN.find_iter(content).count()
        + CAPS_PATTERN.find_iter(content).count()
        + repeated_runs(content)
}

pub fn is_spam(content: &str) -> bool {
    spam_score(content) > SPAM_THRESHOLD
}

/// Counts maximal runs of one character repeated at least [`REPEAT_RUN`]
/// times. Newlines never form part of a run.
fn repeated_runs(content: &str) -> usize {
    let mut runs = 0;
    let mut current: Option<char> = None;
    let mut length = 0;

    for c in content.chars() {
        if Some(c) == current && c != '\n' {
            length += 1;
        } else {
            if length >= REPEAT_RUN {
                runs += 1;
            }
            current = Some(c);
            length = 1;
        }
    }
    if length >= REPEAT_RUN {
        runs += 1;
    }
    runs
}
