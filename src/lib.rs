//! # Omnistat
//!
//! Omnichain indexing status aggregator: estimates, cheaply and
//! conservatively, how far behind realtime a multi-chain indexing
//! deployment is, and serves that estimate over HTTP.
//!
//! ## Features
//!
//! - **Per-chain classification**: raw engine observations become one of
//!   five snapshot variants (queued, backfill, completed, following,
//!   errored), with invariant checks folding bad data into `errored`
//! - **Worst-wins aggregation**: one omnichain status and a progress
//!   cursor at the minimum progress timestamp across chains
//! - **Realtime projection**: a pure function of the cursor and the
//!   current clock, recomputed per request with zero I/O
//! - **Stale-while-revalidate cache**: bounded-latency reads with
//!   single-flight fetches, error backoff, and proactive revalidation
//! - **HTTP API**: status endpoint, health probes, and gating middleware
//!   for downstream consumers
//!
//! ## Modules
//!
//! - [`status`] - Snapshot types, classification, aggregation, projection
//! - [`cache`] - Generic stale-while-revalidate cache
//! - [`upstream`] - Chain status source (indexing engine HTTP client)
//! - [`service`] - Cached aggregation pipeline
//! - [`api`] - Axum HTTP server
//! - [`config`] - TOML + environment configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use omnistat::cache::SwrCacheConfig;
//! use omnistat::service::IndexingStatusService;
//! use omnistat::upstream::{HttpChainSource, UpstreamConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = Arc::new(HttpChainSource::new(UpstreamConfig::default()));
//!     let service = IndexingStatusService::new(
//!         source,
//!         [1, 10].into_iter().collect(),
//!         SwrCacheConfig::default(),
//!     );
//!     let _revalidation = service.start_revalidation();
//!
//!     if let Ok(projection) = service.projection().await {
//!         println!("worst-case distance: {:?}", projection.worst_case_distance);
//!     }
//! }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod service;
pub mod status;
pub mod upstream;

pub use config::Config;
pub use service::IndexingStatusService;
pub use status::{
    ChainIndexingStatusSnapshot, OmnichainIndexingStatusSnapshot, OmnichainStatus,
    RealtimeIndexingStatusProjection,
};
