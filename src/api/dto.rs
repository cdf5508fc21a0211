//! Data Transfer Objects
//!
//! Response types for the API endpoints, serialized to JSON.
//! Downstream services poll these to build their own local caches, so
//! the wire shapes are camelCase and stable.

use crate::status::RealtimeIndexingStatusProjection;
use serde::Serialize;

/// Response of `GET /api/indexing-status`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingStatusResponse {
    /// "ok" or "error"
    pub response_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realtime_projection: Option<RealtimeIndexingStatusProjection>,
}

impl IndexingStatusResponse {
    pub fn ok(projection: RealtimeIndexingStatusProjection) -> Self {
        Self {
            response_code: "ok".to_string(),
            realtime_projection: Some(projection),
        }
    }

    /// Only ever returned before the very first successful refresh
    pub fn error() -> Self {
        Self {
            response_code: "error".to_string(),
            realtime_projection: None,
        }
    }
}

/// Response of `GET /health`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// "healthy", "degraded" (cache stale or errored status) or
    /// "unpopulated"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omnichain_status: Option<String>,
    /// Seconds since the last successful refresh
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_age_seconds: Option<i64>,
    pub uptime_seconds: u64,
    pub version: String,
}
