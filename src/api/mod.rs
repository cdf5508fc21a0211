//! Omnistat HTTP API
//!
//! HTTP layer for the indexing status service, built with Axum.
//!
//! # Endpoints
//!
//! ## Status
//! - `GET /api/indexing-status` - Current realtime projection
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe (cache populated)
//! - `GET /health` - Full health status
//!
//! # Middleware
//!
//! [`middleware::realtime_gate`] and [`middleware::availability_gate`]
//! are exported for downstream routers that branch on the cached status;
//! see the middleware module for the contracts.
//!
//! # Example
//!
//! ```rust,ignore
//! use omnistat::api::{build_router, serve, ApiConfig, AppState};
//! use omnistat::cache::SwrCacheConfig;
//! use omnistat::service::IndexingStatusService;
//! use omnistat::upstream::{HttpChainSource, UpstreamConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Arc::new(HttpChainSource::new(UpstreamConfig::default()));
//!     let status = Arc::new(IndexingStatusService::new(
//!         source,
//!         [1].into_iter().collect(),
//!         SwrCacheConfig::default(),
//!     ));
//!     let config = ApiConfig::default();
//!
//!     serve(AppState::new(status, config.clone()), &config).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use middleware::{availability_gate, realtime_gate, RealtimeGate};
pub use state::{ApiConfig, AppState};

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new().route(
        "/indexing-status",
        get(routes::indexing_status::get_indexing_status),
    );

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()) // Configure properly in production
        .with_state(shared_state)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Omnistat API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Omnistat API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
