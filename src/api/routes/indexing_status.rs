//! Indexing Status Route
//!
//! - GET /api/indexing-status - Current realtime projection
//!
//! Polled by downstream services (not end users) to build their own
//! local cache of the omnichain status. The 500/error form appears only
//! before the very first successful refresh; afterwards the endpoint
//! keeps serving through upstream outages with a stale projection.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::dto::IndexingStatusResponse;
use crate::api::state::AppState;

/// GET /api/indexing-status
pub async fn get_indexing_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.status.projection().await {
        Ok(projection) => (
            StatusCode::OK,
            Json(IndexingStatusResponse::ok(projection)),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "indexing status requested before first refresh");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(IndexingStatusResponse::error()),
            )
        }
    }
}
