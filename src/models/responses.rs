//! Response DTOs for the journal API

use serde::Serialize;

use crate::auth::Session;
use crate::cache::CacheStats;
use crate::store::{MediaFile, Memory};

/// `{"success": true}`
#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Public view of a session. Carries no token material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub username: String,
    #[serde(rename = "isLoggedIn")]
    pub is_logged_in: bool,
}

/// Response body for GET /api/verify-session
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub session: Option<SessionInfo>,
}

impl From<Option<Session>> for SessionResponse {
    fn from(session: Option<Session>) -> Self {
        Self {
            session: session.map(|session| SessionInfo {
                username: session.username,
                is_logged_in: session.is_logged_in,
            }),
        }
    }
}

/// A memory together with its media, as served by GET /api/memories.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryView {
    #[serde(flatten)]
    pub memory: Memory,
    pub media: Vec<MediaFile>,
}

/// Response body for GET /api/cache/stats
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub evictions: u64,
    pub size: usize,
    pub max_size: usize,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl From<CacheStats> for CacheStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            expirations: stats.expirations,
            evictions: stats.evictions,
            size: stats.size,
            max_size: stats.max_size,
        }
    }
}

/// Response body for GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Current time, RFC 3339
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    #[test]
    fn test_session_response_null() {
        let json = serde_json::to_value(SessionResponse::from(None)).unwrap();
        assert_eq!(json, serde_json::json!({ "session": null }));
    }

    #[test]
    fn test_session_response_fields() {
        let now = Utc::now();
        let session = Session {
            username: "egesu".into(),
            is_logged_in: true,
            session_id: "abc".into(),
            issued_at: now,
            expires_at: now,
        };
        let json = serde_json::to_value(SessionResponse::from(Some(session))).unwrap();

        assert_eq!(json["session"]["username"], "egesu");
        assert_eq!(json["session"]["isLoggedIn"], true);
        assert!(json["session"].get("session_id").is_none());
    }

    #[test]
    fn test_memory_view_flattens_memory() {
        let view = MemoryView {
            memory: Memory {
                id: "m1".into(),
                title: "Trip".into(),
                body: None,
                taken_at: NaiveDate::from_ymd_opt(2023, 5, 2).unwrap(),
                city_code: "35".into(),
                album_id: None,
                created_at: Utc::now(),
            },
            media: vec![],
        };
        let json = serde_json::to_value(view).unwrap();

        assert_eq!(json["id"], "m1");
        assert_eq!(json["taken_at"], "2023-05-02");
        assert!(json["media"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_cache_stats_hit_rate() {
        let mut stats = CacheStats::new(100);
        for _ in 0..4 {
            stats.record_hit();
        }
        stats.record_miss();

        let resp = CacheStatsResponse::from(stats);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
        assert_eq!(resp.max_size, 100);
    }

    #[test]
    fn test_health_response_serialize() {
        let json = serde_json::to_string(&HealthResponse::healthy()).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
