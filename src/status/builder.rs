//! Chain Snapshot Builder
//!
//! Classifies one chain's raw observation into a status variant.
//! Classification order matters: a finite configured range stays in
//! `Backfill` even when caught up to the safe head, because the remaining
//! target is still known.

use crate::status::error::ChainSnapshotInvariantError;
use crate::status::types::{BlockRef, ChainId, ChainIndexingStatusSnapshot};
use serde::{Deserialize, Serialize};

/// Raw per-chain data pulled from the indexing engine and chain RPC.
///
/// This is the wire format of the chain status source; everything past
/// `start_block` is optional because a chain reports progressively more
/// fields as it moves through its lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainObservation {
    pub start_block: BlockRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_block: Option<BlockRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_synced_block: Option<BlockRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_indexed_block: Option<BlockRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_safe_block: Option<BlockRef>,
    /// Engine-reported size of the historical sync, in blocks. Carries no
    /// timestamp, so it cannot stand in for a block ref; kept for progress
    /// reporting only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backfill_target_block_count: Option<u64>,
}

/// Classify one chain's observation into a status variant.
///
/// Returns an invariant error when a required field is missing for the
/// chain's configuration or the block numbers are inconsistent; callers
/// fold that into the chain's `Errored` variant for the cycle.
pub fn build_chain_snapshot(
    chain_id: ChainId,
    obs: &ChainObservation,
) -> Result<ChainIndexingStatusSnapshot, ChainSnapshotInvariantError> {
    if let Some(end) = obs.end_block {
        if end.number < obs.start_block.number {
            return Err(ChainSnapshotInvariantError::EndBelowStartBlock {
                chain_id,
                start: obs.start_block.number,
                end: end.number,
            });
        }
    }

    let Some(indexed) = obs.latest_indexed_block else {
        return Ok(ChainIndexingStatusSnapshot::Queued {
            start_block: obs.start_block,
            end_block: obs.end_block,
        });
    };

    if indexed.number < obs.start_block.number {
        return Err(ChainSnapshotInvariantError::IndexedBelowStartBlock {
            chain_id,
            indexed: indexed.number,
            start: obs.start_block.number,
        });
    }

    if let Some(safe) = obs.latest_safe_block {
        if indexed.number > safe.number {
            return Err(ChainSnapshotInvariantError::IndexedBeyondSafeHead {
                chain_id,
                indexed: indexed.number,
                safe: safe.number,
            });
        }
    }

    if let Some(end) = obs.end_block {
        if indexed.number > end.number {
            return Err(ChainSnapshotInvariantError::IndexedBeyondEndBlock {
                chain_id,
                indexed: indexed.number,
                end: end.number,
            });
        }

        if indexed.number == end.number {
            return Ok(ChainIndexingStatusSnapshot::Completed {
                start_block: obs.start_block,
                end_block: end,
                latest_indexed_block: indexed,
            });
        }

        // Finite range not yet reached: still backfilling, even when the
        // indexed head has caught up to the chain's safe head.
        let safe = require_safe_block(chain_id, obs)?;
        return Ok(ChainIndexingStatusSnapshot::Backfill {
            start_block: obs.start_block,
            latest_indexed_block: indexed,
            backfill_end_block: end,
            latest_safe_block: safe,
        });
    }

    // Indefinite chain
    let safe = require_safe_block(chain_id, obs)?;
    if indexed.number >= safe.number {
        Ok(ChainIndexingStatusSnapshot::Following {
            start_block: obs.start_block,
            latest_indexed_block: indexed,
            latest_safe_block: safe,
        })
    } else {
        // The sync engine's current target is the best known backfill end;
        // fall back to the safe head when the engine hasn't reported one.
        let target = obs.latest_synced_block.unwrap_or(safe);
        Ok(ChainIndexingStatusSnapshot::Backfill {
            start_block: obs.start_block,
            latest_indexed_block: indexed,
            backfill_end_block: target,
            latest_safe_block: safe,
        })
    }
}

fn require_safe_block(
    chain_id: ChainId,
    obs: &ChainObservation,
) -> Result<BlockRef, ChainSnapshotInvariantError> {
    obs.latest_safe_block
        .ok_or(ChainSnapshotInvariantError::MissingField {
            chain_id,
            field: "latestSafeBlock",
        })
}

/// Build a snapshot, folding invariant violations into the `Errored`
/// variant so a single bad chain never aborts the cycle.
pub fn build_chain_snapshot_or_errored(
    chain_id: ChainId,
    obs: &ChainObservation,
) -> ChainIndexingStatusSnapshot {
    match build_chain_snapshot(chain_id, obs) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(chain_id, error = %e, "chain observation violated an invariant");
            ChainIndexingStatusSnapshot::Errored {
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(number: u64, timestamp: i64) -> BlockRef {
        BlockRef::new(number, timestamp)
    }

    fn observation(start: BlockRef) -> ChainObservation {
        ChainObservation {
            start_block: start,
            end_block: None,
            latest_synced_block: None,
            latest_indexed_block: None,
            latest_safe_block: None,
            backfill_target_block_count: None,
        }
    }

    #[test]
    fn test_no_indexed_block_is_queued() {
        let obs = observation(block(100, 1_700_000_000));
        let snapshot = build_chain_snapshot(1, &obs).unwrap();
        assert_eq!(
            snapshot,
            ChainIndexingStatusSnapshot::Queued {
                start_block: block(100, 1_700_000_000),
                end_block: None,
            }
        );
    }

    #[test]
    fn test_finite_range_reached_is_completed() {
        let mut obs = observation(block(0, 1_600_000_000));
        obs.end_block = Some(block(500, 1_650_000_000));
        obs.latest_indexed_block = Some(block(500, 1_650_000_000));
        let snapshot = build_chain_snapshot(1, &obs).unwrap();
        assert!(matches!(
            snapshot,
            ChainIndexingStatusSnapshot::Completed { .. }
        ));
    }

    #[test]
    fn test_finite_range_unreached_is_backfill_even_at_safe_head() {
        let mut obs = observation(block(0, 1_600_000_000));
        obs.end_block = Some(block(500, 1_650_000_000));
        obs.latest_indexed_block = Some(block(300, 1_630_000_000));
        obs.latest_safe_block = Some(block(300, 1_630_000_000));
        let snapshot = build_chain_snapshot(1, &obs).unwrap();
        match snapshot {
            ChainIndexingStatusSnapshot::Backfill {
                backfill_end_block, ..
            } => assert_eq!(backfill_end_block.number, 500),
            other => panic!("expected backfill, got {:?}", other),
        }
    }

    #[test]
    fn test_indefinite_chain_at_safe_head_is_following() {
        let mut obs = observation(block(0, 1_600_000_000));
        obs.latest_indexed_block = Some(block(900, 1_700_000_000));
        obs.latest_safe_block = Some(block(900, 1_700_000_000));
        let snapshot = build_chain_snapshot(1, &obs).unwrap();
        assert!(matches!(
            snapshot,
            ChainIndexingStatusSnapshot::Following { .. }
        ));
    }

    #[test]
    fn test_indefinite_chain_behind_safe_head_is_backfill() {
        let mut obs = observation(block(0, 1_600_000_000));
        obs.latest_indexed_block = Some(block(100, 1_610_000_000));
        obs.latest_synced_block = Some(block(800, 1_690_000_000));
        obs.latest_safe_block = Some(block(900, 1_700_000_000));
        let snapshot = build_chain_snapshot(1, &obs).unwrap();
        match snapshot {
            ChainIndexingStatusSnapshot::Backfill {
                backfill_end_block,
                latest_safe_block,
                ..
            } => {
                assert_eq!(backfill_end_block.number, 800);
                assert_eq!(latest_safe_block.number, 900);
            }
            other => panic!("expected backfill, got {:?}", other),
        }
    }

    #[test]
    fn test_indexed_beyond_safe_head_is_invariant_error() {
        let mut obs = observation(block(0, 1_600_000_000));
        obs.latest_indexed_block = Some(block(901, 1_700_000_010));
        obs.latest_safe_block = Some(block(900, 1_700_000_000));
        let err = build_chain_snapshot(7, &obs).unwrap_err();
        assert_eq!(
            err,
            ChainSnapshotInvariantError::IndexedBeyondSafeHead {
                chain_id: 7,
                indexed: 901,
                safe: 900,
            }
        );
    }

    #[test]
    fn test_missing_safe_block_is_invariant_error() {
        let mut obs = observation(block(0, 1_600_000_000));
        obs.latest_indexed_block = Some(block(100, 1_610_000_000));
        let err = build_chain_snapshot(3, &obs).unwrap_err();
        assert!(matches!(
            err,
            ChainSnapshotInvariantError::MissingField { chain_id: 3, .. }
        ));
    }

    #[test]
    fn test_invariant_violation_folds_into_errored_variant() {
        let mut obs = observation(block(0, 1_600_000_000));
        obs.latest_indexed_block = Some(block(901, 1_700_000_010));
        obs.latest_safe_block = Some(block(900, 1_700_000_000));
        let snapshot = build_chain_snapshot_or_errored(7, &obs);
        assert!(snapshot.is_errored());
    }

    #[test]
    fn test_observation_deserializes_from_camel_case() {
        let json = r#"{
            "startBlock": {"number": 0, "timestamp": 1600000000},
            "latestIndexedBlock": {"number": 10, "timestamp": 1600001200},
            "latestSafeBlock": {"number": 10, "timestamp": 1600001200}
        }"#;
        let obs: ChainObservation = serde_json::from_str(json).unwrap();
        assert_eq!(obs.start_block.number, 0);
        assert_eq!(obs.latest_indexed_block.unwrap().number, 10);
        assert!(obs.end_block.is_none());
    }
}
