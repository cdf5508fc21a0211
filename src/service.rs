//! Indexing Status Service
//!
//! Binds the chain status source, the snapshot builder, and the omnichain
//! aggregator into a single SWR cache instance, and exposes the two
//! request-scoped reads consumers gate on: the realtime projection and
//! the serviceability check. Constructed once during process startup and
//! injected into request handlers; no global state.

use crate::cache::{CachedValue, RevalidationHandle, SwrCache, SwrCacheConfig, SwrCacheError, SwrFetcher};
use crate::status::{
    aggregate, build_chain_snapshot_or_errored, project, slowest_chain, ChainId,
    ChainIndexingStatusSnapshot, OmnichainIndexingStatusSnapshot,
    RealtimeIndexingStatusProjection,
};
use crate::upstream::ChainStatusSource;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Produces one omnichain snapshot per refresh cycle.
///
/// Per-chain failures (unreachable source, invariant violations) fold
/// into that chain's `Errored` variant; only a configured-set mismatch
/// fails the whole cycle.
struct OmnichainStatusFetcher {
    source: Arc<dyn ChainStatusSource>,
    configured_chains: BTreeSet<ChainId>,
}

#[async_trait]
impl SwrFetcher<OmnichainIndexingStatusSnapshot> for OmnichainStatusFetcher {
    async fn fetch(&self) -> anyhow::Result<OmnichainIndexingStatusSnapshot> {
        // A fully unreachable engine still produces a snapshot: every
        // configured chain is reported errored for the cycle.
        let observed_ids = match self.source.indexed_chain_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(error = %e, "chain status source unreachable");
                let chains = self
                    .configured_chains
                    .iter()
                    .map(|&chain_id| {
                        (
                            chain_id,
                            ChainIndexingStatusSnapshot::Errored {
                                reason: e.to_string(),
                            },
                        )
                    })
                    .collect();
                return Ok(aggregate(&self.configured_chains, chains)?);
            }
        };

        let mut chains = BTreeMap::new();
        for &chain_id in &observed_ids {
            let snapshot = match self.source.observe(chain_id).await {
                Ok(observation) => build_chain_snapshot_or_errored(chain_id, &observation),
                Err(e) => {
                    tracing::warn!(chain_id, error = %e, "chain status source unavailable");
                    ChainIndexingStatusSnapshot::Errored {
                        reason: e.to_string(),
                    }
                }
            };
            chains.insert(chain_id, snapshot);
        }

        let snapshot = aggregate(&self.configured_chains, chains)?;

        if let Some((chain_id, cursor)) = slowest_chain(&snapshot) {
            tracing::debug!(
                chain_id,
                cursor,
                omnichain_status = %snapshot.omnichain_status,
                "omnichain snapshot refreshed"
            );
        }

        Ok(snapshot)
    }
}

/// Long-lived owner of the indexing status cache
pub struct IndexingStatusService {
    cache: SwrCache<OmnichainIndexingStatusSnapshot>,
}

impl IndexingStatusService {
    /// Wire a chain status source into a cached aggregation pipeline.
    ///
    /// `configured_chains` is fixed for the process lifetime; the
    /// aggregator rejects any refresh cycle whose observed set differs.
    pub fn new(
        source: Arc<dyn ChainStatusSource>,
        configured_chains: BTreeSet<ChainId>,
        cache_config: SwrCacheConfig,
    ) -> Self {
        let fetcher = Arc::new(OmnichainStatusFetcher {
            source,
            configured_chains,
        });

        Self {
            cache: SwrCache::new(fetcher, cache_config),
        }
    }

    /// Start the proactive revalidation timer, if configured
    pub fn start_revalidation(&self) -> Option<RevalidationHandle> {
        self.cache.start_revalidation()
    }

    /// The cached omnichain snapshot.
    ///
    /// Errors only before the first successful refresh of the process.
    pub async fn snapshot(
        &self,
    ) -> Result<CachedValue<OmnichainIndexingStatusSnapshot>, SwrCacheError> {
        self.cache.read().await
    }

    /// Project the cached snapshot to the current wall clock.
    ///
    /// Zero I/O past the cache cell: recomputed per request from the
    /// cursor and `now` alone.
    pub async fn projection(
        &self,
    ) -> Result<RealtimeIndexingStatusProjection, SwrCacheError> {
        let cached = self.cache.read().await?;
        Ok(project(cached.value, cached.cached_at, Utc::now().timestamp()))
    }

    /// Realtime gate: is the worst-case staleness within the budget?
    ///
    /// An unpopulated cache or an unknown distance (every chain errored)
    /// is never realtime.
    pub async fn is_realtime(&self, max_realtime_distance_secs: u64) -> bool {
        match self.projection().await {
            Ok(projection) => projection
                .worst_case_distance
                .map(|distance| distance <= max_realtime_distance_secs)
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Availability gate: has indexing reached a serviceable status?
    ///
    /// An unpopulated cache is never available.
    pub async fn is_available(&self) -> bool {
        match self.cache.read().await {
            Ok(cached) => cached.value.omnichain_status.is_serviceable(),
            Err(_) => false,
        }
    }

    /// Snapshot currently in the cell, without scheduling a refresh
    pub async fn peek(&self) -> Option<CachedValue<OmnichainIndexingStatusSnapshot>> {
        self.cache.peek().await
    }
}
