//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (status cache populated)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Returns 200 once the status cache has been populated at least once;
/// a stale cache is still ready (stale-while-revalidate serves it).
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    match state.status.peek().await {
        Some(_) => StatusCode::OK,
        None => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// GET /health
///
/// Full health status with cache and aggregate detail. Reads the cell
/// without scheduling a refresh, so probes do not perturb cache timing.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let cached = state.status.peek().await;

    let (status, omnichain_status, cache_age_seconds) = match cached {
        Some(cached) => {
            let age = Utc::now().timestamp() - cached.cached_at;
            let omnichain = cached.value.omnichain_status;
            let status = if omnichain.is_serviceable() {
                "healthy"
            } else {
                "degraded"
            };
            (status, Some(omnichain.to_string()), Some(age))
        }
        None => ("unpopulated", None, None),
    };

    Json(HealthResponse {
        status: status.to_string(),
        omnichain_status,
        cache_age_seconds,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
