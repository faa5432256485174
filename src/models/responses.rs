//! Response DTOs for the campus API
//!
//! Defines the structure of outgoing HTTP response bodies that are not
//! plain entities.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for the mark average endpoints
#[derive(Debug, Clone, Serialize)]
pub struct AverageResponse {
    /// Mean mark, null when there are no marks
    pub average: Option<f64>,
}

/// Response body for deletions and updates
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for `GET /cache/stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    pub max_size: usize,
    pub max_age_ms: u64,
}

impl StatsResponse {
    pub fn new(stats: CacheStats, max_size: usize, max_age_ms: u64) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
            max_size,
            max_age_ms,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_response_flattens_counters() {
        let stats = CacheStats {
            hits: 8,
            misses: 2,
            rejections: 1,
            expirations: 3,
            size: 4,
        };
        let json = serde_json::to_value(StatsResponse::new(stats, 100, 60_000)).unwrap();
        assert_eq!(json["hits"], 8);
        assert_eq!(json["rejections"], 1);
        assert_eq!(json["max_size"], 100);
        assert!((json["hit_rate"].as_f64().unwrap() - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_average_response_null() {
        let json = serde_json::to_string(&AverageResponse { average: None }).unwrap();
        assert_eq!(json, r#"{"average":null}"#);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
