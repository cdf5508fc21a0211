//! Omnichain indexing status domain
//!
//! The pure core of the service: per-chain snapshot classification, the
//! worst-wins omnichain aggregation, and the zero-I/O realtime projection.
//! Nothing in this module performs I/O; the upstream source and the SWR
//! cache live elsewhere and feed data through here.

pub mod aggregator;
pub mod builder;
pub mod error;
pub mod projection;
pub mod types;

pub use aggregator::{aggregate, slowest_chain};
pub use builder::{build_chain_snapshot, build_chain_snapshot_or_errored, ChainObservation};
pub use error::{AggregationSetMismatchError, ChainSnapshotInvariantError};
pub use projection::{project, RealtimeIndexingStatusProjection};
pub use types::{
    BlockRef, ChainId, ChainIndexingStatusSnapshot, OmnichainIndexingStatusSnapshot,
    OmnichainStatus,
};
