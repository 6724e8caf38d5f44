//! Consumer-side view of the query cache

use catalog_core::QueryKey;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use super::{QueryCache, QueryStatus};
use crate::error::{CatalogError, Result};

/// What an observer currently shows for its key
#[derive(Debug)]
pub enum ObservedPhase<V> {
    /// No key observed yet
    Idle,
    /// Request pending and nothing to show
    LoadingFresh,
    /// Request pending; older data (same key or the previous key) is shown
    LoadingWithStale(Arc<V>),
    /// Settled with data
    Success(Arc<V>),
    /// Settled with a failure
    Error(CatalogError),
}

impl<V> Clone for ObservedPhase<V> {
    fn clone(&self) -> Self {
        match self {
            ObservedPhase::Idle => ObservedPhase::Idle,
            ObservedPhase::LoadingFresh => ObservedPhase::LoadingFresh,
            ObservedPhase::LoadingWithStale(data) => ObservedPhase::LoadingWithStale(Arc::clone(data)),
            ObservedPhase::Success(data) => ObservedPhase::Success(Arc::clone(data)),
            ObservedPhase::Error(err) => ObservedPhase::Error(err.clone()),
        }
    }
}

/// Flags and data handed to a consumer for one render
#[derive(Debug)]
pub struct Observation<V> {
    /// Key being observed
    pub key: Option<QueryKey>,
    pub phase: ObservedPhase<V>,
    /// Data to display; may belong to the previous key while loading
    pub data: Option<Arc<V>>,
    /// No data at all and a request is pending
    pub is_loading: bool,
    /// A request for the current or previous key is in flight
    pub is_fetching: bool,
    pub is_error: bool,
    pub error: Option<CatalogError>,
    /// `data` belongs to the previously observed key
    pub is_previous_data: bool,
}

impl<V> Observation<V> {
    fn idle() -> Self {
        Self {
            key: None,
            phase: ObservedPhase::Idle,
            data: None,
            is_loading: false,
            is_fetching: false,
            is_error: false,
            error: None,
            is_previous_data: false,
        }
    }

    /// Human-readable failure message for inline display
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

impl<V> Clone for Observation<V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            phase: self.phase.clone(),
            data: self.data.clone(),
            is_loading: self.is_loading,
            is_fetching: self.is_fetching,
            is_error: self.is_error,
            error: self.error.clone(),
            is_previous_data: self.is_previous_data,
        }
    }
}

/// Follows one query key at a time.
///
/// Switching keys issues the request for the new key (or reuses the cached
/// result) and keeps exposing the last successful data until the new key
/// settles. Results for keys the observer has moved away from only update
/// the cache.
pub struct QueryObserver<V> {
    cache: QueryCache<V>,
    current: Option<QueryKey>,
    previous: Option<(QueryKey, Arc<V>)>,
    updates: watch::Receiver<u64>,
}

impl<V> QueryObserver<V>
where
    V: Send + Sync + 'static,
{
    pub fn new(cache: QueryCache<V>) -> Self {
        let updates = cache.subscribe();

        Self {
            cache,
            current: None,
            previous: None,
            updates,
        }
    }

    pub fn cache(&self) -> &QueryCache<V> {
        &self.cache
    }

    pub fn current_key(&self) -> Option<&QueryKey> {
        self.current.as_ref()
    }

    /// Observe `key`, requesting it if the observer was on a different key.
    ///
    /// Observing the key that is already current does not issue a request;
    /// use [`QueryObserver::refetch`] for that.
    pub fn observe<F, Fut>(&mut self, key: QueryKey, producer: F) -> Observation<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        if self.current.as_ref() != Some(&key) {
            if let Some(old) = self.current.take() {
                if let Some(data) = self.cache.state(&old).data {
                    self.previous = Some((old, data));
                }
            }

            debug!("👀 Observing query {}", key.fingerprint());
            self.cache.ensure(&key, producer);
            self.current = Some(key);
        }

        self.snapshot()
    }

    /// Force a new request for the current key
    pub fn refetch<F, Fut>(&mut self, producer: F) -> Observation<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        if let Some(key) = &self.current {
            // the returned handle is not needed, the fetch runs detached
            let _ = self.cache.refetch(key, producer);
        }

        self.snapshot()
    }

    /// Current observation without issuing any request
    pub fn snapshot(&mut self) -> Observation<V> {
        let Some(key) = self.current.clone() else {
            return Observation::idle();
        };

        let state = self.cache.state(&key);
        let previous_fetching = self
            .previous
            .as_ref()
            .is_some_and(|(previous, _)| *previous != key && self.cache.state(previous).is_fetching);

        let mut observation = Observation {
            key: Some(key.clone()),
            phase: ObservedPhase::Idle,
            data: None,
            is_loading: false,
            is_fetching: state.is_fetching || previous_fetching,
            is_error: false,
            error: None,
            is_previous_data: false,
        };

        if state.is_fetching {
            match (&state.data, &self.previous) {
                (Some(data), _) => {
                    observation.phase = ObservedPhase::LoadingWithStale(Arc::clone(data));
                    observation.data = Some(Arc::clone(data));
                }
                (None, Some((_, previous))) => {
                    observation.phase = ObservedPhase::LoadingWithStale(Arc::clone(previous));
                    observation.data = Some(Arc::clone(previous));
                    observation.is_previous_data = true;
                }
                (None, None) => {
                    observation.phase = ObservedPhase::LoadingFresh;
                    observation.is_loading = true;
                }
            }
            return observation;
        }

        match (state.status, state.data, state.error) {
            (QueryStatus::Success, Some(data), _) => {
                self.previous = Some((key, Arc::clone(&data)));
                observation.phase = ObservedPhase::Success(Arc::clone(&data));
                observation.data = Some(data);
            }
            (QueryStatus::Error, data, Some(err)) => {
                observation.phase = ObservedPhase::Error(err.clone());
                observation.data = data;
                observation.is_error = true;
                observation.error = Some(err);
            }
            _ => {}
        }

        observation
    }

    /// Wait for the current key's in-flight request, then observe
    pub async fn settle(&mut self) -> Observation<V> {
        let pending = self
            .current
            .as_ref()
            .and_then(|key| self.cache.pending(key));

        if let Some(pending) = pending {
            // the outcome is read back from the cache by `snapshot`
            let _ = pending.await;
        }

        self.snapshot()
    }

    /// Wait until any cache entry changes; false once the cache is gone
    pub async fn changed(&mut self) -> bool {
        self.updates.changed().await.is_ok()
    }
}
