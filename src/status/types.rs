//! Core data types for omnichain indexing status
//!
//! This module defines the fundamental types of the status domain:
//! - `BlockRef`: A block identified by number and timestamp
//! - `ChainIndexingStatusSnapshot`: One chain's indexing state
//! - `OmnichainIndexingStatusSnapshot`: The aggregate across all chains
//! - `OmnichainStatus`: The folded status classification

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of an indexed chain (positive integer)
pub type ChainId = u64;

/// A reference to a block: its height and its unix-seconds timestamp.
///
/// Immutable once observed; timestamps are what the omnichain cursor
/// and the realtime projection are computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRef {
    /// Block height
    pub number: u64,
    /// Unix timestamp of the block, in seconds
    pub timestamp: i64,
}

impl BlockRef {
    pub fn new(number: u64, timestamp: i64) -> Self {
        Self { number, timestamp }
    }
}

/// One chain's indexing state for a single snapshot cycle.
///
/// A chain progresses `Queued -> Backfill -> {Completed | Following}`;
/// `Errored` is reachable from any state when the chain's raw data could
/// not be determined or violated an invariant. Every consumption site
/// matches exhaustively so a new variant cannot be silently ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ChainIndexingStatusSnapshot {
    /// Indexing has not started yet
    Queued {
        start_block: BlockRef,
        #[serde(skip_serializing_if = "Option::is_none")]
        end_block: Option<BlockRef>,
    },
    /// Historical catch-up in progress
    Backfill {
        start_block: BlockRef,
        latest_indexed_block: BlockRef,
        /// The historical-sync target. For a finite range this is the
        /// configured end block; for an indefinite chain it is the sync
        /// engine's current target.
        backfill_end_block: BlockRef,
        latest_safe_block: BlockRef,
    },
    /// A finite configured range has been fully indexed
    Completed {
        start_block: BlockRef,
        end_block: BlockRef,
        latest_indexed_block: BlockRef,
    },
    /// An indefinite chain has caught up and tracks its safe head
    Following {
        start_block: BlockRef,
        latest_indexed_block: BlockRef,
        latest_safe_block: BlockRef,
    },
    /// The chain's status could not be determined this cycle
    Errored { reason: String },
}

impl ChainIndexingStatusSnapshot {
    /// The chain's progress timestamp: how far along chain-time this
    /// chain's indexed view is.
    ///
    /// `Queued` chains have not indexed anything, so their progress is
    /// pinned at the configured start block. `Errored` chains carry no
    /// usable progress and return `None`.
    pub fn progress_timestamp(&self) -> Option<i64> {
        match self {
            Self::Queued { start_block, .. } => Some(start_block.timestamp),
            Self::Backfill {
                latest_indexed_block,
                ..
            }
            | Self::Completed {
                latest_indexed_block,
                ..
            }
            | Self::Following {
                latest_indexed_block,
                ..
            } => Some(latest_indexed_block.timestamp),
            Self::Errored { .. } => None,
        }
    }

    /// Whether this chain failed to report a usable status this cycle
    pub fn is_errored(&self) -> bool {
        matches!(self, Self::Errored { .. })
    }
}

/// The folded status of the whole deployment, worst-wins across chains
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum OmnichainStatus {
    /// No chain has started indexing
    Unstarted,
    /// At least one chain is still queued or backfilling
    Backfill,
    /// Every chain has fully indexed its finite configured range
    Completed,
    /// All chains caught up; at least one tracks an indefinite head
    Following,
    /// At least one chain's status could not be determined
    Errored,
}

impl OmnichainStatus {
    /// Whether dependent features may serve requests under this status.
    ///
    /// Only fully-caught-up deployments are serviceable; `Errored` and
    /// in-progress statuses are not.
    pub fn is_serviceable(&self) -> bool {
        match self {
            OmnichainStatus::Completed | OmnichainStatus::Following => true,
            OmnichainStatus::Unstarted | OmnichainStatus::Backfill | OmnichainStatus::Errored => {
                false
            }
        }
    }
}

impl std::fmt::Display for OmnichainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OmnichainStatus::Unstarted => write!(f, "unstarted"),
            OmnichainStatus::Backfill => write!(f, "backfill"),
            OmnichainStatus::Completed => write!(f, "completed"),
            OmnichainStatus::Following => write!(f, "following"),
            OmnichainStatus::Errored => write!(f, "errored"),
        }
    }
}

/// The aggregate indexing state across every configured chain.
///
/// Produced atomically by the aggregator on each refresh cycle and never
/// mutated afterwards; a newer snapshot replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OmnichainIndexingStatusSnapshot {
    pub omnichain_status: OmnichainStatus,
    pub chains: BTreeMap<ChainId, ChainIndexingStatusSnapshot>,
    /// Minimum progress timestamp across all non-errored chains, in unix
    /// seconds. `None` only when every configured chain is errored.
    pub omnichain_indexing_cursor: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(number: u64, timestamp: i64) -> BlockRef {
        BlockRef::new(number, timestamp)
    }

    #[test]
    fn test_progress_timestamp_queued_uses_start_block() {
        let snapshot = ChainIndexingStatusSnapshot::Queued {
            start_block: block(100, 1_700_000_000),
            end_block: None,
        };
        assert_eq!(snapshot.progress_timestamp(), Some(1_700_000_000));
    }

    #[test]
    fn test_progress_timestamp_uses_latest_indexed_block() {
        let snapshot = ChainIndexingStatusSnapshot::Following {
            start_block: block(0, 1_600_000_000),
            latest_indexed_block: block(500, 1_700_000_300),
            latest_safe_block: block(500, 1_700_000_300),
        };
        assert_eq!(snapshot.progress_timestamp(), Some(1_700_000_300));
    }

    #[test]
    fn test_progress_timestamp_errored_is_none() {
        let snapshot = ChainIndexingStatusSnapshot::Errored {
            reason: "rpc unreachable".to_string(),
        };
        assert_eq!(snapshot.progress_timestamp(), None);
        assert!(snapshot.is_errored());
    }

    #[test]
    fn test_serviceable_statuses() {
        assert!(OmnichainStatus::Completed.is_serviceable());
        assert!(OmnichainStatus::Following.is_serviceable());
        assert!(!OmnichainStatus::Unstarted.is_serviceable());
        assert!(!OmnichainStatus::Backfill.is_serviceable());
        assert!(!OmnichainStatus::Errored.is_serviceable());
    }

    #[test]
    fn test_chain_snapshot_serializes_with_status_tag() {
        let snapshot = ChainIndexingStatusSnapshot::Backfill {
            start_block: block(0, 1_600_000_000),
            latest_indexed_block: block(50, 1_650_000_000),
            backfill_end_block: block(100, 1_700_000_000),
            latest_safe_block: block(120, 1_700_000_100),
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"], "backfill");
        assert_eq!(json["latestIndexedBlock"]["number"], 50);
        assert_eq!(json["backfillEndBlock"]["timestamp"], 1_700_000_000);
    }
}
