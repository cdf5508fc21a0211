//! Status domain errors
//!
//! Per-chain inconsistencies are contained: they surface as that chain's
//! `Errored` variant for the cycle. Set mismatches fail the whole refresh
//! cycle and surface through the cache as a refresh failure.

use crate::status::types::ChainId;
use thiserror::Error;

/// A single chain's raw observation is internally inconsistent.
///
/// Never fatal to the process; the affected chain is reported `Errored`
/// for the cycle instead of silently defaulting.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainSnapshotInvariantError {
    #[error("chain {chain_id}: missing required field `{field}` for current configuration")]
    MissingField {
        chain_id: ChainId,
        field: &'static str,
    },

    #[error("chain {chain_id}: latest indexed block {indexed} is beyond safe head {safe}")]
    IndexedBeyondSafeHead {
        chain_id: ChainId,
        indexed: u64,
        safe: u64,
    },

    #[error("chain {chain_id}: latest indexed block {indexed} is beyond configured end block {end}")]
    IndexedBeyondEndBlock {
        chain_id: ChainId,
        indexed: u64,
        end: u64,
    },

    #[error("chain {chain_id}: latest indexed block {indexed} is below start block {start}")]
    IndexedBelowStartBlock {
        chain_id: ChainId,
        indexed: u64,
        start: u64,
    },

    #[error("chain {chain_id}: configured end block {end} is below start block {start}")]
    EndBelowStartBlock {
        chain_id: ChainId,
        start: u64,
        end: u64,
    },
}

/// The observed chain set does not match the configured chain set.
///
/// Fatal to the refresh cycle: aggregation refuses to produce a snapshot
/// that silently drops or invents chains.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("observed chain set does not match configuration (missing: {missing:?}, unexpected: {unexpected:?})")]
pub struct AggregationSetMismatchError {
    /// Configured chains absent from the observation set
    pub missing: Vec<ChainId>,
    /// Observed chains absent from the configuration
    pub unexpected: Vec<ChainId>,
}
