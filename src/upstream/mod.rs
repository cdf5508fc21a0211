//! Chain Status Source
//!
//! The boundary to the indexing engine: per chain, supplies the raw
//! observation (start block, latest synced/safe/indexed blocks, optional
//! end block) that the snapshot builder classifies. Everything behind
//! this trait is out of scope for the status domain; failures here fold
//! into the chain's `Errored` variant, never abort a cycle.

pub mod http;

pub use http::{HttpChainSource, UpstreamConfig};

use crate::status::{ChainId, ChainObservation};
use async_trait::async_trait;
use std::collections::BTreeSet;
use thiserror::Error;

/// Provider of raw indexing observations
#[async_trait]
pub trait ChainStatusSource: Send + Sync {
    /// The chain ids the engine is currently indexing.
    ///
    /// Aggregation validates this against the deployment's configured
    /// set; a mismatch fails the refresh cycle rather than producing a
    /// snapshot that silently drops or invents chains.
    async fn indexed_chain_ids(&self) -> Result<BTreeSet<ChainId>, UpstreamError>;

    /// Pull the current observation for one chain
    async fn observe(&self, chain_id: ChainId) -> Result<ChainObservation, UpstreamError>;
}

/// Failures reaching the chain status source
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The source could not be reached at all
    #[error("chain status source unreachable")]
    Unavailable,

    /// The request did not complete in time
    #[error("chain status request timed out")]
    Timeout,

    /// The source answered with a non-success status
    #[error("chain status source returned {0}")]
    Status(reqwest::StatusCode),

    /// Transport-level request failure
    #[error("chain status request failed: {0}")]
    Request(reqwest::Error),

    /// The response body did not parse as an observation
    #[error("invalid chain status payload: {0}")]
    InvalidPayload(String),
}
