//! Generic stale-while-revalidate caching
//!
//! One cell, one writer role (the refresh routine), many concurrent
//! readers. The indexing status service wraps its snapshot producer in a
//! [`SwrCache`]; nothing in here knows about chains or snapshots.

pub mod swr;

pub use swr::{
    CachedValue, RevalidationHandle, SwrCache, SwrCacheConfig, SwrCacheError, SwrFetcher,
};
