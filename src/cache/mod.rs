//! Async query cache
//!
//! [`QueryCache`] owns the request lifecycle per [`QueryKey`](catalog_core::QueryKey):
//! one in-flight fetch per key, memoized outcomes, and a staleness window
//! after which data is served immediately but refreshed in the background.
//! [`QueryObserver`] is the consumer side: it follows one key at a time and
//! keeps showing the previous key's data while a new key loads.

pub mod observer;
pub mod store;

use std::sync::Arc;
use tokio::time::Instant;

use crate::error::CatalogError;

pub use observer::{Observation, ObservedPhase, QueryObserver};
pub use store::{CacheStats, QueryCache};

/// Lifecycle status of a cached query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Never requested
    Idle,
    /// First fetch in flight, no data yet
    Loading,
    /// Last fetch succeeded
    Success,
    /// Last fetch failed
    Error,
}

/// Snapshot of one cache entry
#[derive(Debug)]
pub struct QueryState<V> {
    pub status: QueryStatus,
    /// Data from the most recent successful fetch
    pub data: Option<Arc<V>>,
    /// Failure from the most recent fetch, cleared on success
    pub error: Option<CatalogError>,
    /// When the most recent successful fetch completed
    pub last_fetched_at: Option<Instant>,
    /// A fetch for this key is in flight
    pub is_fetching: bool,
}

impl<V> QueryState<V> {
    /// State of a key nobody has requested yet
    pub fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            last_fetched_at: None,
            is_fetching: false,
        }
    }
}

// Manual impl: `V` itself does not need to be `Clone` behind the `Arc`.
impl<V> Clone for QueryState<V> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            last_fetched_at: self.last_fetched_at,
            is_fetching: self.is_fetching,
        }
    }
}
