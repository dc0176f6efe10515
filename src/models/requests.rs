//! Request DTOs for the journal API
//!
//! Every field is optional at the wire level so that a missing field is
//! answered with a 400 and a readable message rather than a rejection from
//! the JSON extractor.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::store::NewMedia;

/// Request body for POST /api/login
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl LoginRequest {
    /// Both fields, when present and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let username = self.username.as_deref().filter(|u| !u.is_empty())?;
        let password = self.password.as_deref().filter(|p| !p.is_empty())?;
        Some((username, password))
    }
}

/// Request body for POST /api/memories
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateMemoryRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Calendar date, `YYYY-MM-DD`
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub city_code: Option<String>,
    #[serde(default)]
    pub album_id: Option<String>,
    #[serde(default)]
    pub media: Vec<NewMedia>,
}

impl CreateMemoryRequest {
    /// Returns an error message if a required field is missing.
    pub fn validate(&self) -> Option<String> {
        if blank(&self.title) || blank(&self.date) || blank(&self.city_code) {
            return Some("Title, date and city are required".to_string());
        }
        None
    }
}

/// Request body for POST /api/letters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateLetterRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl CreateLetterRequest {
    pub fn validate(&self) -> Option<String> {
        if blank(&self.title) || blank(&self.body) {
            return Some("Title and body are required".to_string());
        }
        None
    }
}

/// Request body for POST /api/anniversaries
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAnniversaryRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    /// Recurs every year unless explicitly disabled
    #[serde(default = "default_repeat")]
    pub repeat: bool,
}

impl CreateAnniversaryRequest {
    pub fn validate(&self) -> Option<String> {
        if blank(&self.title) || blank(&self.date) {
            return Some("Title and date are required".to_string());
        }
        None
    }
}

fn default_repeat() -> bool {
    true
}

fn blank(field: &Option<String>) -> bool {
    field.as_deref().map_or(true, |value| value.trim().is_empty())
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}
