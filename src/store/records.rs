//! Rows exchanged with the journal backend.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A dated, located memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub title: String,
    pub body: Option<String>,
    pub taken_at: NaiveDate,
    pub city_code: String,
    pub album_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMemory {
    pub title: String,
    pub body: Option<String>,
    pub taken_at: NaiveDate,
    pub city_code: String,
    pub album_id: Option<String>,
}

/// A photo or video attached to a memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFile {
    pub id: String,
    pub memory_id: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub original_name: String,
    #[serde(default = "default_file_type")]
    pub file_type: String,
    #[serde(default)]
    pub public_url: String,
    #[serde(default)]
    pub storage_path: String,
    #[serde(default)]
    pub file_size: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMedia {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub original_name: String,
    #[serde(default = "default_file_type")]
    pub file_type: String,
    #[serde(default)]
    pub public_url: String,
    #[serde(default)]
    pub storage_path: String,
    #[serde(default)]
    pub file_size: i64,
}

fn default_file_type() -> String {
    "application/octet-stream".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Letter {
    pub id: String,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLetter {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anniversary {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub repeat: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnniversary {
    pub title: String,
    pub date: NaiveDate,
    pub repeat: bool,
}
