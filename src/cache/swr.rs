//! Stale-While-Revalidate Cache
//!
//! A generic single-cell cache wrapping an async fetcher. Serves the last
//! known-good value immediately and refreshes in the background, so a
//! reader never waits on the fetcher once a value exists. Fetch attempts
//! are single-flight: concurrent readers and timer ticks share one
//! outstanding attempt.
//!
//! Freshness is measured with the runtime's monotonic clock, so a reader
//! can never observe a cache age that regresses; the `cached_at` exposed
//! to consumers is the wall-clock unix time of the last successful fetch.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Asynchronous producer of cache values.
///
/// Timeouts belong inside implementations (e.g. an HTTP client timeout);
/// the cache never cancels an in-flight fetch.
#[async_trait]
pub trait SwrFetcher<T>: Send + Sync {
    async fn fetch(&self) -> anyhow::Result<T>;
}

/// Cache behavior configuration
#[derive(Debug, Clone)]
pub struct SwrCacheConfig {
    /// How long a fetched value stays fresh. `None` means unbounded: a
    /// value never goes stale from a reader's point of view.
    pub ttl: Option<Duration>,
    /// How long to wait before retrying after a failed fetch
    pub error_ttl: Duration,
    /// If set, a background timer refreshes on this cadence independent
    /// of reads
    pub proactive_revalidation_interval: Option<Duration>,
    /// Trigger the first fetch at construction rather than on first read
    pub proactively_initialize: bool,
}

impl Default for SwrCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Some(Duration::from_secs(30)),
            error_ttl: Duration::from_secs(15),
            proactive_revalidation_interval: None,
            proactively_initialize: false,
        }
    }
}

/// A successfully fetched value and when it was fetched
#[derive(Debug, Clone)]
pub struct CachedValue<T> {
    pub value: T,
    /// Unix seconds of the successful fetch
    pub cached_at: i64,
}

/// Read failure: only possible before the first successful fetch.
///
/// Once a cache cell has been populated, later fetch failures are logged
/// and the last good value keeps being served; they never reach readers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SwrCacheError {
    #[error("cache has never been populated: {reason}")]
    NeverPopulated {
        reason: String,
        /// Unix seconds of the failed attempt
        failed_at: i64,
    },
}

#[derive(Debug)]
struct FailedFetch {
    reason: String,
    failed_at: i64,
    attempted_at: Instant,
}

#[derive(Debug)]
struct Inner<T> {
    value: Option<CachedValue<T>>,
    fetched_at: Option<Instant>,
    last_failure: Option<FailedFetch>,
}

/// A single-cell stale-while-revalidate cache.
///
/// Cheap to clone; clones share the same cell.
pub struct SwrCache<T> {
    inner: Arc<RwLock<Inner<T>>>,
    /// Serializes every fetch attempt (single-flight)
    fetch_lock: Arc<Mutex<()>>,
    /// Guards against piling up background refresh tasks
    refresh_pending: Arc<AtomicBool>,
    fetcher: Arc<dyn SwrFetcher<T>>,
    config: SwrCacheConfig,
}

impl<T> Clone for SwrCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            fetch_lock: Arc::clone(&self.fetch_lock),
            refresh_pending: Arc::clone(&self.refresh_pending),
            fetcher: Arc::clone(&self.fetcher),
            config: self.config.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> SwrCache<T> {
    /// Create a cache around a fetcher.
    ///
    /// With `proactively_initialize` set, the first fetch is kicked off
    /// immediately in the background; requires a running tokio runtime.
    pub fn new(fetcher: Arc<dyn SwrFetcher<T>>, config: SwrCacheConfig) -> Self {
        let cache = Self {
            inner: Arc::new(RwLock::new(Inner {
                value: None,
                fetched_at: None,
                last_failure: None,
            })),
            fetch_lock: Arc::new(Mutex::new(())),
            refresh_pending: Arc::new(AtomicBool::new(false)),
            fetcher,
            config,
        };

        if cache.config.proactively_initialize {
            cache.spawn_refresh(false);
        }

        cache
    }

    /// Read the cached value.
    ///
    /// Fresh hit: returned immediately. Stale hit: the stale value is
    /// returned immediately and a background refresh is scheduled if none
    /// is in flight. Cold start: awaits the (shared) fetch and returns
    /// its outcome.
    pub async fn read(&self) -> Result<CachedValue<T>, SwrCacheError> {
        {
            let inner = self.inner.read().await;
            if let Some(cached) = &inner.value {
                if self.is_fresh(&inner) {
                    return Ok(cached.clone());
                }
                let stale = cached.clone();
                drop(inner);
                self.spawn_refresh(false);
                return Ok(stale);
            }
        }

        self.cold_read().await
    }

    /// Current value without scheduling any refresh, for introspection
    pub async fn peek(&self) -> Option<CachedValue<T>> {
        self.inner.read().await.value.clone()
    }

    /// Start the proactive revalidation timer, if configured.
    ///
    /// The timer communicates with readers only through the shared cache
    /// cell; ticks no-op while a fetch is in flight or the cell is in
    /// error backoff. Returns `None` when no interval is configured.
    pub fn start_revalidation(&self) -> Option<RevalidationHandle> {
        let interval = self.config.proactive_revalidation_interval?;
        let cache = self.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; the cache was already
            // initialized (or will be on first read), so skip it.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                cache.spawn_refresh(true);
            }
        });

        Some(RevalidationHandle { handle })
    }

    fn is_fresh(&self, inner: &Inner<T>) -> bool {
        match (self.config.ttl, inner.fetched_at) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(ttl), Some(fetched_at)) => fetched_at.elapsed() < ttl,
        }
    }

    fn in_error_backoff(&self, inner: &Inner<T>) -> bool {
        inner
            .last_failure
            .as_ref()
            .map(|failure| failure.attempted_at.elapsed() < self.config.error_ttl)
            .unwrap_or(false)
    }

    /// Cold start: no value has ever been produced. Awaiting the fetch
    /// lock shares any in-flight attempt's outcome with this caller.
    async fn cold_read(&self) -> Result<CachedValue<T>, SwrCacheError> {
        let _guard = self.fetch_lock.lock().await;

        {
            let inner = self.inner.read().await;
            if let Some(cached) = &inner.value {
                // Another caller completed the fetch while we waited.
                return Ok(cached.clone());
            }
            if let Some(failure) = &inner.last_failure {
                if failure.attempted_at.elapsed() < self.config.error_ttl {
                    return Err(SwrCacheError::NeverPopulated {
                        reason: failure.reason.clone(),
                        failed_at: failure.failed_at,
                    });
                }
            }
        }

        self.run_fetch().await
    }

    /// Schedule a background refresh if none is pending.
    ///
    /// `force` refreshes even a still-fresh value (proactive timer ticks);
    /// stale-read triggers pass `false` and skip when another refresh made
    /// the value fresh in the meantime. Error backoff applies to both.
    fn spawn_refresh(&self, force: bool) {
        if self.refresh_pending.swap(true, Ordering::SeqCst) {
            return;
        }

        let cache = self.clone();
        tokio::spawn(async move {
            cache.background_refresh(force).await;
            cache.refresh_pending.store(false, Ordering::SeqCst);
        });
    }

    async fn background_refresh(&self, force: bool) {
        let _guard = self.fetch_lock.lock().await;

        {
            let inner = self.inner.read().await;
            if !force && self.is_fresh(&inner) {
                return;
            }
            if self.in_error_backoff(&inner) {
                return;
            }
        }

        let _ = self.run_fetch().await;
    }

    /// Run one fetch attempt. Caller must hold `fetch_lock`.
    async fn run_fetch(&self) -> Result<CachedValue<T>, SwrCacheError> {
        match self.fetcher.fetch().await {
            Ok(value) => {
                let cached = CachedValue {
                    value,
                    cached_at: Utc::now().timestamp(),
                };
                let mut inner = self.inner.write().await;
                inner.value = Some(cached.clone());
                inner.fetched_at = Some(Instant::now());
                inner.last_failure = None;
                Ok(cached)
            }
            Err(e) => {
                let reason = e.to_string();
                let failed_at = Utc::now().timestamp();
                let mut inner = self.inner.write().await;
                inner.last_failure = Some(FailedFetch {
                    reason: reason.clone(),
                    failed_at,
                    attempted_at: Instant::now(),
                });
                match &inner.value {
                    Some(previous) => {
                        // The last good value stays servable.
                        tracing::warn!(
                            error = %reason,
                            cached_at = previous.cached_at,
                            "cache refresh failed, serving last good value"
                        );
                        Ok(previous.clone())
                    }
                    None => Err(SwrCacheError::NeverPopulated { reason, failed_at }),
                }
            }
        }
    }
}

/// Cancellable handle to the proactive revalidation timer
pub struct RevalidationHandle {
    handle: JoinHandle<()>,
}

impl RevalidationHandle {
    /// Stop the timer. In-flight refreshes run to completion.
    pub fn stop(self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    /// Fetcher serving a scripted sequence of outcomes, counting calls.
    /// Repeats the final outcome once the script is exhausted.
    struct ScriptedFetcher {
        calls: AtomicUsize,
        script: std::sync::Mutex<VecDeque<anyhow::Result<u64>>>,
        delay: Option<Duration>,
    }

    impl ScriptedFetcher {
        fn new(script: Vec<anyhow::Result<u64>>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                script: std::sync::Mutex::new(script.into()),
                delay: None,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SwrFetcher<u64> for ScriptedFetcher {
        async fn fetch(&self) -> anyhow::Result<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                match script.front() {
                    Some(Ok(v)) => Ok(*v),
                    Some(Err(e)) => Err(anyhow::anyhow!(e.to_string())),
                    None => Ok(0),
                }
            }
        }
    }

    /// Fetcher whose second call blocks until released
    struct GatedFetcher {
        calls: AtomicUsize,
        gate: Notify,
    }

    #[async_trait]
    impl SwrFetcher<u64> for GatedFetcher {
        async fn fetch(&self) -> anyhow::Result<u64> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call > 0 {
                self.gate.notified().await;
                Ok(200)
            } else {
                Ok(100)
            }
        }
    }

    fn config(ttl: u64, error_ttl: u64) -> SwrCacheConfig {
        SwrCacheConfig {
            ttl: Some(Duration::from_secs(ttl)),
            error_ttl: Duration::from_secs(error_ttl),
            proactive_revalidation_interval: None,
            proactively_initialize: false,
        }
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_cold_reads_share_one_fetch() {
        let fetcher = Arc::new(
            ScriptedFetcher::new(vec![Ok(42)]).with_delay(Duration::from_millis(50)),
        );
        let cache = SwrCache::new(fetcher.clone() as Arc<dyn SwrFetcher<u64>>, config(30, 15));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.read().await }));
        }
        for handle in handles {
            let cached = handle.await.unwrap().unwrap();
            assert_eq!(cached.value, 42);
        }

        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_value_served_without_fetch() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(1)]));
        let cache = SwrCache::new(fetcher.clone() as Arc<dyn SwrFetcher<u64>>, config(30, 15));

        assert_eq!(cache.read().await.unwrap().value, 1);
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(cache.read().await.unwrap().value, 1);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_read_returns_old_value_and_refreshes_in_background() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(1), Ok(2)]));
        let cache = SwrCache::new(fetcher.clone() as Arc<dyn SwrFetcher<u64>>, config(30, 15));

        assert_eq!(cache.read().await.unwrap().value, 1);
        tokio::time::advance(Duration::from_secs(31)).await;

        // Stale hit: old value now, refresh happens behind our back.
        assert_eq!(cache.read().await.unwrap().value, 1);
        settle().await;

        assert_eq!(cache.read().await.unwrap().value, 2);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_read_does_not_block_on_pending_fetch() {
        let fetcher = Arc::new(GatedFetcher {
            calls: AtomicUsize::new(0),
            gate: Notify::new(),
        });
        let cache = SwrCache::new(fetcher.clone() as Arc<dyn SwrFetcher<u64>>, config(30, 15));

        assert_eq!(cache.read().await.unwrap().value, 100);
        tokio::time::advance(Duration::from_secs(31)).await;

        // The refresh is gated shut; the stale value must come back anyway.
        assert_eq!(cache.read().await.unwrap().value, 100);
        settle().await;
        assert_eq!(cache.read().await.unwrap().value, 100);

        // Release the refresh and observe the new value.
        fetcher.gate.notify_one();
        settle().await;
        assert_eq!(cache.read().await.unwrap().value, 200);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_serving_last_good_value() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            Ok(7),
            Err(anyhow::anyhow!("upstream down")),
        ]));
        let cache = SwrCache::new(fetcher.clone() as Arc<dyn SwrFetcher<u64>>, config(30, 60));

        assert_eq!(cache.read().await.unwrap().value, 7);
        tokio::time::advance(Duration::from_secs(31)).await;

        assert_eq!(cache.read().await.unwrap().value, 7);
        settle().await;
        assert_eq!(fetcher.calls(), 2);

        // Within error_ttl: still serving the old value, no new attempt.
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(cache.read().await.unwrap().value, 7);
        settle().await;
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cold_failure_reported_and_backed_off() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Err(anyhow::anyhow!(
            "upstream down"
        ))]));
        let cache = SwrCache::new(fetcher.clone() as Arc<dyn SwrFetcher<u64>>, config(30, 15));

        let err = cache.read().await.unwrap_err();
        assert!(matches!(err, SwrCacheError::NeverPopulated { .. }));
        assert_eq!(fetcher.calls(), 1);

        // Within error_ttl the failure is replayed without a new fetch.
        let err = cache.read().await.unwrap_err();
        assert!(matches!(err, SwrCacheError::NeverPopulated { .. }));
        assert_eq!(fetcher.calls(), 1);

        tokio::time::advance(Duration::from_secs(16)).await;
        let _ = cache.read().await;
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_ttl_never_goes_stale() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(5)]));
        let cache = SwrCache::new(
            fetcher.clone() as Arc<dyn SwrFetcher<u64>>,
            SwrCacheConfig {
                ttl: None,
                ..config(0, 15)
            },
        );

        assert_eq!(cache.read().await.unwrap().value, 5);
        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(cache.read().await.unwrap().value, 5);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_proactive_revalidation_refreshes_without_reads() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(1), Ok(2), Ok(3)]));
        let cache = SwrCache::new(
            fetcher.clone() as Arc<dyn SwrFetcher<u64>>,
            SwrCacheConfig {
                ttl: Some(Duration::from_secs(30)),
                error_ttl: Duration::from_secs(15),
                proactive_revalidation_interval: Some(Duration::from_secs(10)),
                proactively_initialize: true,
            },
        );

        let handle = cache.start_revalidation().expect("interval configured");
        settle().await;
        assert_eq!(cache.peek().await.unwrap().value, 1);

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(cache.peek().await.unwrap().value, 2);

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(cache.peek().await.unwrap().value, 3);

        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_at_does_not_regress_on_failure() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            Ok(1),
            Err(anyhow::anyhow!("down")),
        ]));
        let cache = SwrCache::new(fetcher as Arc<dyn SwrFetcher<u64>>, config(30, 15));

        let first = cache.read().await.unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;
        let _ = cache.read().await.unwrap();
        settle().await;

        let after_failure = cache.peek().await.unwrap();
        assert_eq!(after_failure.cached_at, first.cached_at);
    }
}
