//! Omnichain Aggregator
//!
//! Folds the full set of per-chain snapshots into one omnichain snapshot
//! with a single status (worst-wins) and a single indexing cursor (the
//! minimum progress timestamp across non-errored chains).
//!
//! Pure and side-effect-free; runs in O(number of chains).

use crate::status::error::AggregationSetMismatchError;
use crate::status::types::{
    ChainId, ChainIndexingStatusSnapshot, OmnichainIndexingStatusSnapshot, OmnichainStatus,
};
use std::collections::{BTreeMap, BTreeSet};

/// Aggregate per-chain snapshots into one omnichain snapshot.
///
/// The observed chain set must exactly match the configured set: a
/// snapshot that silently drops a configured chain would let the cursor
/// overstate progress, so any mismatch fails the cycle instead.
pub fn aggregate(
    configured_chains: &BTreeSet<ChainId>,
    chains: BTreeMap<ChainId, ChainIndexingStatusSnapshot>,
) -> Result<OmnichainIndexingStatusSnapshot, AggregationSetMismatchError> {
    let observed: BTreeSet<ChainId> = chains.keys().copied().collect();
    if &observed != configured_chains {
        return Err(AggregationSetMismatchError {
            missing: configured_chains.difference(&observed).copied().collect(),
            unexpected: observed.difference(configured_chains).copied().collect(),
        });
    }

    let omnichain_status = fold_status(chains.values());

    let omnichain_indexing_cursor = chains
        .values()
        .filter_map(ChainIndexingStatusSnapshot::progress_timestamp)
        .min();

    Ok(OmnichainIndexingStatusSnapshot {
        omnichain_status,
        chains,
        omnichain_indexing_cursor,
    })
}

/// Worst-wins fold over the distinct variants present:
/// `Errored > Unstarted > Backfill > Completed/Following`.
fn fold_status<'a>(
    chains: impl Iterator<Item = &'a ChainIndexingStatusSnapshot>,
) -> OmnichainStatus {
    let mut any_errored = false;
    let mut any_queued = false;
    let mut any_backfill = false;
    let mut any_following = false;
    let mut total = 0usize;
    let mut queued = 0usize;
    let mut completed = 0usize;

    for chain in chains {
        total += 1;
        match chain {
            ChainIndexingStatusSnapshot::Errored { .. } => any_errored = true,
            ChainIndexingStatusSnapshot::Queued { .. } => {
                any_queued = true;
                queued += 1;
            }
            ChainIndexingStatusSnapshot::Backfill { .. } => any_backfill = true,
            ChainIndexingStatusSnapshot::Completed { .. } => completed += 1,
            ChainIndexingStatusSnapshot::Following { .. } => any_following = true,
        }
    }

    if any_errored {
        OmnichainStatus::Errored
    } else if queued == total {
        OmnichainStatus::Unstarted
    } else if any_queued || any_backfill {
        OmnichainStatus::Backfill
    } else if completed == total {
        OmnichainStatus::Completed
    } else {
        debug_assert!(any_following);
        OmnichainStatus::Following
    }
}

/// The chain currently holding the cursor back, for diagnostics.
///
/// When several chains share the minimum progress timestamp, the lowest
/// chain id wins (the cursor value itself is unaffected by ties).
pub fn slowest_chain(
    snapshot: &OmnichainIndexingStatusSnapshot,
) -> Option<(ChainId, i64)> {
    let cursor = snapshot.omnichain_indexing_cursor?;
    snapshot
        .chains
        .iter()
        .find(|(_, chain)| chain.progress_timestamp() == Some(cursor))
        .map(|(&chain_id, _)| (chain_id, cursor))
}
