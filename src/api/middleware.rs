//! Gating Middleware
//!
//! The two consumer contracts around the cached status:
//!
//! - **Realtime gate**: computes `is_realtime` from the current
//!   projection and the configured distance budget, and attaches it to
//!   the request as an extension. Downstream handlers (protocol
//!   acceleration, legacy-API fallback) branch on the boolean; the gate
//!   itself never rejects.
//! - **Availability gate**: rejects with 503 unless the omnichain status
//!   is serviceable (`Completed` or `Following`). Independent of the
//!   realtime gate.
//!
//! Both treat an unpopulated cache strictly more conservatively than any
//! known status.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::state::AppState;

/// Realtime verdict attached to requests passing the realtime gate
#[derive(Debug, Clone, Copy)]
pub struct RealtimeGate {
    /// Whether the worst-case staleness is within the configured budget
    pub is_realtime: bool,
    /// The distance the verdict was computed from, if known
    pub worst_case_distance: Option<u64>,
}

/// Attach a [`RealtimeGate`] extension to the request
pub async fn realtime_gate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let gate = match state.status.projection().await {
        Ok(projection) => {
            let budget = state.config.max_realtime_distance_secs;
            RealtimeGate {
                is_realtime: projection
                    .worst_case_distance
                    .map(|distance| distance <= budget)
                    .unwrap_or(false),
                worst_case_distance: projection.worst_case_distance,
            }
        }
        Err(_) => RealtimeGate {
            is_realtime: false,
            worst_case_distance: None,
        },
    };

    request.extensions_mut().insert(gate);
    next.run(request).await
}

/// Reject with 503 unless indexing has reached a serviceable status
pub async fn availability_gate(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if state.status.is_available().await {
        next.run(request).await
    } else {
        ApiError::ServiceUnavailable(
            "indexing has not reached a serviceable status".to_string(),
        )
        .into_response()
    }
}
