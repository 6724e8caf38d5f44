//! Keyed store of query outcomes with in-flight deduplication

use catalog_core::QueryKey;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{QueryState, QueryStatus};
use crate::error::{CatalogError, Result};

/// How long a successful result counts as fresh
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(30);

/// Handle on an in-flight fetch; every clone resolves to the same outcome
pub type PendingFetch<V> = Shared<BoxFuture<'static, Result<Arc<V>>>>;

struct CacheEntry<V> {
    state: QueryState<V>,
    pending: Option<PendingFetch<V>>,
    /// Generation of the newest fetch started; only that fetch may write the entry
    generation: u64,
    invalidated: bool,
    touched_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(now: Instant) -> Self {
        Self {
            state: QueryState::idle(),
            pending: None,
            generation: 0,
            invalidated: false,
            touched_at: now,
        }
    }

    fn is_fresh(&self, now: Instant, stale_time: Duration) -> bool {
        self.state.status == QueryStatus::Success
            && !self.invalidated
            && self
                .state
                .last_fetched_at
                .is_some_and(|at| now.duration_since(at) < stale_time)
    }
}

struct Inner<V> {
    entries: Mutex<HashMap<QueryKey, CacheEntry<V>>>,
    stale_time: Duration,
    version: watch::Sender<u64>,
    /// Cache-wide, so an entry recreated after `remove`/`clear` never reuses a generation
    generations: AtomicU64,
}

impl<V> Inner<V> {
    // Never held across an await; a poisoned map is still usable.
    fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        self.version.send_modify(|version| *version = version.wrapping_add(1));
    }

    fn settle(&self, key: &QueryKey, generation: u64, outcome: &Result<Arc<V>>) {
        {
            let mut entries = self.entries();
            let Some(entry) = entries.get_mut(key) else {
                debug!("Dropping result for removed query {}", key.fingerprint());
                return;
            };

            if entry.generation != generation {
                debug!(
                    "Discarding superseded response for {} (generation {}, newest {})",
                    key.fingerprint(),
                    generation,
                    entry.generation
                );
                return;
            }

            entry.pending = None;
            entry.state.is_fetching = false;

            match outcome {
                Ok(data) => {
                    entry.state.status = QueryStatus::Success;
                    entry.state.data = Some(Arc::clone(data));
                    entry.state.error = None;
                    entry.state.last_fetched_at = Some(Instant::now());
                    entry.invalidated = false;
                    debug!("💾 Cached result for {}", key.fingerprint());
                }
                Err(err) => {
                    entry.state.status = QueryStatus::Error;
                    entry.state.error = Some(err.clone());
                    warn!("Query {} failed: {}", key.fingerprint(), err);
                }
            }
        }

        self.notify();
    }
}

/// Cache statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
    pub stale_entries: usize,
    pub in_flight: usize,
    pub failed_entries: usize,
}

/// Shared cache of query outcomes keyed by [`QueryKey`].
///
/// Cloning is cheap and every clone sees the same entries. Fetches run as
/// detached tokio tasks, so dropping every waiter does not cancel a fetch;
/// its result still lands in the cache.
pub struct QueryCache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for QueryCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Default for QueryCache<V>
where
    V: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}

impl<V> QueryCache<V>
where
    V: Send + Sync + 'static,
{
    /// Create a cache whose successes stay fresh for `stale_time`
    pub fn new(stale_time: Duration) -> Self {
        let (version, _) = watch::channel(0);

        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                stale_time,
                version,
                generations: AtomicU64::new(0),
            }),
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.inner.stale_time
    }

    /// Receiver that ticks whenever an entry changes
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.version.subscribe()
    }

    /// Current state of `key`, idle when it was never requested
    pub fn state(&self, key: &QueryKey) -> QueryState<V> {
        self.inner
            .entries()
            .get(key)
            .map(|entry| entry.state.clone())
            .unwrap_or_else(QueryState::idle)
    }

    /// True if `key` holds a success younger than the staleness window
    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        self.inner
            .entries()
            .get(key)
            .is_some_and(|entry| entry.is_fresh(Instant::now(), self.inner.stale_time))
    }

    /// The in-flight fetch for `key`, if any
    pub fn pending(&self, key: &QueryKey) -> Option<PendingFetch<V>> {
        self.inner
            .entries()
            .get(key)
            .and_then(|entry| entry.pending.clone())
    }

    /// Make sure `key` is either fresh or being fetched, without waiting.
    ///
    /// `producer` is only called when a new fetch has to start: the key is
    /// unknown, failed, invalidated or stale, and nothing is in flight.
    /// Returns the entry state right after the decision.
    pub fn ensure<F, Fut>(&self, key: &QueryKey, producer: F) -> QueryState<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let (snapshot, started) = {
            let mut entries = self.inner.entries();
            let now = Instant::now();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(now));
            entry.touched_at = now;

            let started = if entry.pending.is_some() {
                debug!("Query {} already in flight", key.fingerprint());
                false
            } else if entry.is_fresh(now, self.inner.stale_time) {
                debug!("📚 Cache hit for {}", key.fingerprint());
                false
            } else {
                if entry.state.data.is_some() {
                    debug!("⏰ Query {} is stale, refreshing in background", key.fingerprint());
                }
                self.start_fetch(key, entry, producer);
                true
            };

            (entry.state.clone(), started)
        };

        if started {
            self.inner.notify();
        }
        snapshot
    }

    /// Resolve `key` to data.
    ///
    /// Fresh data is returned without calling `producer`. Stale data is also
    /// returned immediately while a refresh starts in the background.
    /// Otherwise the call joins the in-flight fetch or starts one and waits.
    pub async fn fetch<F, Fut>(&self, key: QueryKey, producer: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let (pending, stale, started) = {
            let mut entries = self.inner.entries();
            let now = Instant::now();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(now));
            entry.touched_at = now;

            if entry.is_fresh(now, self.inner.stale_time) {
                if let Some(data) = &entry.state.data {
                    debug!("📚 Cache hit for {}", key.fingerprint());
                    return Ok(Arc::clone(data));
                }
            }

            let (pending, started) = if let Some(pending) = entry.pending.clone() {
                debug!("Joining in-flight query {}", key.fingerprint());
                (pending, false)
            } else {
                (self.start_fetch(&key, entry, producer), true)
            };

            (pending, entry.state.data.clone(), started)
        };

        if started {
            self.inner.notify();
        }

        match stale {
            Some(data) => Ok(data),
            None => pending.await,
        }
    }

    /// Start a new fetch for `key` even if one is in flight or data is fresh.
    ///
    /// An older in-flight fetch for the same key still completes but can no
    /// longer write the entry.
    pub fn refetch<F, Fut>(&self, key: &QueryKey, producer: F) -> PendingFetch<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let pending = {
            let mut entries = self.inner.entries();
            let now = Instant::now();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(now));
            entry.touched_at = now;

            self.start_fetch(key, entry, producer)
        };

        self.inner.notify();
        pending
    }

    /// Mark `key` stale so the next request fetches again
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let found = match self.inner.entries().get_mut(key) {
            Some(entry) => {
                entry.invalidated = true;
                true
            }
            None => false,
        };

        if found {
            debug!("🗑️ Invalidated query {}", key.fingerprint());
            self.inner.notify();
        }
        found
    }

    /// Drop `key` from the cache; an in-flight fetch for it is discarded on arrival
    pub fn remove(&self, key: &QueryKey) -> bool {
        let removed = self.inner.entries().remove(key).is_some();
        if removed {
            self.inner.notify();
        }
        removed
    }

    /// Drop every entry
    pub fn clear(&self) -> usize {
        let cleared = {
            let mut entries = self.inner.entries();
            let count = entries.len();
            entries.clear();
            count
        };

        if cleared > 0 {
            debug!("🧹 Cleared {} cached queries", cleared);
            self.inner.notify();
        }
        cleared
    }

    /// Drop settled entries nobody requested for at least `max_age`
    pub fn cleanup_unused(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let removed = {
            let mut entries = self.inner.entries();
            let before = entries.len();
            entries.retain(|_, entry| {
                entry.pending.is_some() || now.duration_since(entry.touched_at) < max_age
            });
            before - entries.len()
        };

        if removed > 0 {
            debug!("🧹 Cleaned up {} unused queries", removed);
            self.inner.notify();
        }
        removed
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.inner.entries();
        let mut stats = CacheStats {
            total_entries: entries.len(),
            ..CacheStats::default()
        };

        for entry in entries.values() {
            if entry.pending.is_some() {
                stats.in_flight += 1;
            }
            match entry.state.status {
                QueryStatus::Success if entry.is_fresh(now, self.inner.stale_time) => {
                    stats.fresh_entries += 1
                }
                QueryStatus::Success => stats.stale_entries += 1,
                QueryStatus::Error => stats.failed_entries += 1,
                QueryStatus::Idle | QueryStatus::Loading => {}
            }
        }

        stats
    }

    fn start_fetch<F, Fut>(
        &self,
        key: &QueryKey,
        entry: &mut CacheEntry<V>,
        producer: F,
    ) -> PendingFetch<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let generation = self.inner.generations.fetch_add(1, Ordering::Relaxed) + 1;
        entry.generation = generation;

        if entry.state.data.is_none() {
            entry.state.status = QueryStatus::Loading;
        }
        entry.state.is_fetching = true;

        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let request = producer();
        let handle = tokio::spawn(async move {
            // a panicking producer still has to release the entry
            let outcome = match AssertUnwindSafe(request).catch_unwind().await {
                Ok(result) => result.map(Arc::new),
                Err(_) => Err(CatalogError::TransportFailure(
                    "fetch panicked before completing".to_string(),
                )),
            };
            inner.settle(&task_key, generation, &outcome);
            outcome
        });

        let pending = async move {
            handle.await.unwrap_or_else(|err| {
                Err(CatalogError::TransportFailure(format!(
                    "fetch task ended unexpectedly: {}",
                    err
                )))
            })
        }
        .boxed()
        .shared();

        entry.pending = Some(pending.clone());
        debug!(
            "🔄 Fetching {} (generation {})",
            key.fingerprint(),
            generation
        );

        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn key(search: &str) -> QueryKey {
        catalog_core::FilterSet::builder().search(search).build().query_key()
    }

    fn counting_producer(
        calls: &Arc<AtomicUsize>,
        value: u32,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<u32>> {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(value) }.boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_hit_skips_producer() {
        let cache = QueryCache::new(Duration::from_secs(30));
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache.fetch(key("a"), counting_producer(&calls, 1)).await.unwrap();
        tokio::time::advance(Duration::from_secs(29)).await;
        let second = cache.fetch(key("a"), counting_producer(&calls, 2)).await.unwrap();

        assert_eq!(*first, 1);
        assert_eq!(*second, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.state(&key("a")).status, QueryStatus::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_data_is_served_while_refreshing() {
        let cache = QueryCache::new(Duration::from_secs(30));
        let calls = Arc::new(AtomicUsize::new(0));

        cache.fetch(key("a"), counting_producer(&calls, 1)).await.unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;

        let state = cache.ensure(&key("a"), counting_producer(&calls, 2));
        assert_eq!(state.data.as_deref(), Some(&1));
        assert!(state.is_fetching);
        assert_eq!(state.status, QueryStatus::Success);

        cache.pending(&key("a")).unwrap().await.unwrap();
        assert_eq!(cache.state(&key("a")).data.as_deref(), Some(&2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_fetch() {
        let cache = QueryCache::new(DEFAULT_STALE_TIME);
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            cache.fetch(key("a"), counting_producer(&calls, 7)),
            cache.fetch(key("a"), counting_producer(&calls, 8)),
        );

        assert_eq!(*a.unwrap(), 7);
        assert_eq!(*b.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_recorded_and_retried_on_next_request() {
        let cache: QueryCache<u32> = QueryCache::new(DEFAULT_STALE_TIME);

        let err = cache
            .fetch(key("a"), || async { Err(CatalogError::FetchFailure { status: 500 }) })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(500));

        let state = cache.state(&key("a"));
        assert_eq!(state.status, QueryStatus::Error);
        assert!(state.data.is_none());

        let value = cache.fetch(key("a"), || async { Ok(3) }).await.unwrap();
        assert_eq!(*value, 3);
        assert!(cache.state(&key("a")).error.is_none());
    }

    #[tokio::test]
    async fn test_superseded_response_does_not_overwrite() {
        let cache: QueryCache<u32> = QueryCache::new(DEFAULT_STALE_TIME);
        let gate = Arc::new(Notify::new());

        let slow_gate = Arc::clone(&gate);
        let slow = cache.refetch(&key("a"), move || async move {
            slow_gate.notified().await;
            Ok(1)
        });
        let fast = cache.refetch(&key("a"), || async { Ok(2) });

        assert_eq!(*fast.await.unwrap(), 2);
        gate.notify_one();
        assert_eq!(*slow.await.unwrap(), 1);

        assert_eq!(cache.state(&key("a")).data.as_deref(), Some(&2));
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let cache = QueryCache::new(DEFAULT_STALE_TIME);
        let calls = Arc::new(AtomicUsize::new(0));

        cache.fetch(key("a"), counting_producer(&calls, 1)).await.unwrap();
        assert!(cache.is_fresh(&key("a")));

        assert!(cache.invalidate(&key("a")));
        assert!(!cache.is_fresh(&key("a")));
        assert!(!cache.invalidate(&key("missing")));

        cache.ensure(&key("a"), counting_producer(&calls, 2));
        cache.pending(&key("a")).unwrap().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.state(&key("a")).data.as_deref(), Some(&2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_and_stats() {
        let cache = QueryCache::new(Duration::from_secs(30));

        cache.fetch(key("old"), || async { Ok(1u32) }).await.unwrap();
        tokio::time::advance(Duration::from_secs(120)).await;
        cache.fetch(key("new"), || async { Ok(2u32) }).await.unwrap();

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.fresh_entries, 1);
        assert_eq!(stats.stale_entries, 1);

        assert_eq!(cache.cleanup_unused(Duration::from_secs(60)), 1);
        assert_eq!(cache.state(&key("old")).status, QueryStatus::Idle);
        assert_eq!(cache.clear(), 1);
    }

    fn gated(gate: &Arc<Notify>, value: u32) -> impl FnOnce() -> BoxFuture<'static, Result<u32>> {
        let gate = Arc::clone(gate);
        move || {
            async move {
                gate.notified().await;
                Ok(value)
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_fetch_abandoned_by_remove_cannot_overwrite_recreated_entry() {
        let cache: QueryCache<u32> = QueryCache::new(DEFAULT_STALE_TIME);
        let gate = Arc::new(Notify::new());

        let abandoned = cache.refetch(&key("a"), gated(&gate, 1));
        assert!(cache.remove(&key("a")));

        let fresh = cache.fetch(key("a"), || async { Ok(2) }).await.unwrap();
        assert_eq!(*fresh, 2);

        gate.notify_one();
        assert_eq!(*abandoned.await.unwrap(), 1);

        assert_eq!(cache.state(&key("a")).data.as_deref(), Some(&2));
    }

    #[tokio::test]
    async fn test_fetch_abandoned_by_clear_leaves_new_fetch_in_flight() {
        let cache: QueryCache<u32> = QueryCache::new(DEFAULT_STALE_TIME);
        let first_gate = Arc::new(Notify::new());
        let second_gate = Arc::new(Notify::new());

        let abandoned = cache.refetch(&key("a"), gated(&first_gate, 1));
        assert_eq!(cache.clear(), 1);
        cache.ensure(&key("a"), gated(&second_gate, 2));

        first_gate.notify_one();
        abandoned.await.unwrap();

        let state = cache.state(&key("a"));
        assert!(state.data.is_none());
        assert!(state.is_fetching);
        assert!(cache.pending(&key("a")).is_some());

        second_gate.notify_one();
        cache.pending(&key("a")).unwrap().await.unwrap();
        assert_eq!(cache.state(&key("a")).data.as_deref(), Some(&2));
    }

    async fn exploding_fetch() -> Result<u32> {
        panic!("backend client blew up")
    }

    #[tokio::test]
    async fn test_panicking_fetch_releases_entry() {
        let cache: QueryCache<u32> = QueryCache::new(DEFAULT_STALE_TIME);

        let err = cache.fetch(key("a"), exploding_fetch).await.unwrap_err();
        assert!(matches!(err, CatalogError::TransportFailure(_)));

        let state = cache.state(&key("a"));
        assert_eq!(state.status, QueryStatus::Error);
        assert!(!state.is_fetching);
        assert!(cache.pending(&key("a")).is_none());

        let value = cache.fetch(key("a"), || async { Ok(5) }).await.unwrap();
        assert_eq!(*value, 5);
    }

    #[tokio::test]
    async fn test_subscribers_wake_on_settle_and_invalidate() {
        let cache: QueryCache<u32> = QueryCache::new(DEFAULT_STALE_TIME);
        let mut updates = cache.subscribe();
        let gate = Arc::new(Notify::new());

        cache.ensure(&key("a"), gated(&gate, 1));
        updates.changed().await.unwrap();
        updates.borrow_and_update();

        gate.notify_one();
        updates.changed().await.unwrap();
        updates.borrow_and_update();
        assert_eq!(cache.state(&key("a")).data.as_deref(), Some(&1));

        assert!(cache.invalidate(&key("a")));
        assert!(updates.has_changed().unwrap());
    }
}
