//! Realtime Projector
//!
//! Projects a cached omnichain snapshot forward to "now" with zero I/O.
//! The cursor is a fixed point in chain-time captured at snapshot time, so
//! `now - cursor` can only grow until a fresher snapshot is installed;
//! it is always a safe upper bound on real lag, never an under-estimate.

use crate::status::types::OmnichainIndexingStatusSnapshot;
use serde::{Deserialize, Serialize};

/// A request-scoped projection of indexing staleness.
///
/// Derived, never stored; recomputed on every read from wall-clock time
/// alone. `worst_case_distance` is monotonically non-decreasing between
/// two consecutive snapshot replacements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeIndexingStatusProjection {
    pub snapshot: OmnichainIndexingStatusSnapshot,
    /// When the snapshot was captured, unix seconds
    pub snapshot_time: i64,
    /// When this projection was computed, unix seconds
    pub projected_at: i64,
    /// Upper bound on how far behind real time the indexed data is, in
    /// seconds. `None` when the snapshot carries no cursor (every chain
    /// errored); consumers must treat that maximally conservatively.
    pub worst_case_distance: Option<u64>,
}

/// Project a snapshot to `now`.
pub fn project(
    snapshot: OmnichainIndexingStatusSnapshot,
    snapshot_time: i64,
    now: i64,
) -> RealtimeIndexingStatusProjection {
    let worst_case_distance = snapshot
        .omnichain_indexing_cursor
        .map(|cursor| now.saturating_sub(cursor).max(0) as u64);

    RealtimeIndexingStatusProjection {
        snapshot,
        snapshot_time,
        projected_at: now,
        worst_case_distance,
    }
}
