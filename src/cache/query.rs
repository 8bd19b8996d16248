//! Single-flight query resolution over the entry store.
//!
//! Guarantees at most one in-flight fetch per distinct key: concurrent
//! resolvers of the same key share one underlying request. Fetches run as
//! spawned tasks, so a request whose awaiters all drop still completes and
//! lands in the store for the next reader.
//!
//! Ordering: a write applied to a key while a fetch is in flight wins over
//! the fetch result, both in the store and in the value handed back to
//! resolvers. Failures are not stored; the next resolve fetches again.

use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use metrics::{counter, histogram};
use tokio::sync::oneshot;
use tracing::debug;

use crate::application::sources::SourceError;

use super::store::EntryStore;

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, Arc<SourceError>>>>;

/// Removes the key from the in-flight table on drop, so the fetch task
/// deregisters itself even when the fetch future panics.
struct Deregister<K: Hash + Eq, V> {
    in_flight: Arc<DashMap<K, SharedFetch<V>>>,
    key: K,
}

impl<K: Hash + Eq, V> Drop for Deregister<K, V> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.key);
    }
}

/// Render-facing view of one keyed resource.
#[derive(Debug, Clone)]
pub enum QueryState<T> {
    /// No identifier selected, or nothing fetched yet; no call was issued.
    Idle,
    /// A fetch for the key is in flight.
    Loading,
    Ready(T),
    Failed(Arc<SourceError>),
}

impl<T> QueryState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, QueryState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            QueryState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&SourceError> {
        match self {
            QueryState::Failed(error) => Some(error),
            _ => None,
        }
    }
}

impl<T> From<Result<T, Arc<SourceError>>> for QueryState<T> {
    fn from(result: Result<T, Arc<SourceError>>) -> Self {
        match result {
            Ok(value) => QueryState::Ready(value),
            Err(error) => QueryState::Failed(error),
        }
    }
}

/// Per-kind query cache: entry store plus the single-flight table.
pub struct ResourceCache<K: Hash + Eq, V> {
    kind: &'static str,
    entries: Arc<EntryStore<K, V>>,
    in_flight: Arc<DashMap<K, SharedFetch<V>>>,
}

impl<K, V> ResourceCache<K, V>
where
    K: Clone + Eq + Hash + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(kind: &'static str, capacity: NonZeroUsize, stale_after: Option<Duration>) -> Self {
        Self {
            kind,
            entries: Arc::new(EntryStore::new(kind, capacity, stale_after)),
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Resolve `key`: a fresh cache entry answers immediately; otherwise the
    /// caller joins or starts the single in-flight fetch for the key.
    ///
    /// Requires a tokio runtime; the fetch is spawned so it completes even
    /// if every resolver drops mid-flight.
    pub async fn resolve<F, Fut>(&self, key: K, fetch: F) -> Result<V, Arc<SourceError>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, SourceError>> + Send + 'static,
    {
        if let Some(value) = self.entries.fresh(&key) {
            return Ok(value);
        }

        let started = Instant::now();
        let shared = self.join_or_start(key.clone(), fetch);
        let result = shared.await;
        histogram!("ammesso_cache_resolve_ms", "kind" => self.kind)
            .record(started.elapsed().as_secs_f64() * 1000.0);

        // A write that landed while the fetch ran wins over the fetch result.
        if let Some(newer) = self.entries.stored_since(&key, started) {
            return Ok(newer);
        }
        result
    }

    /// Non-blocking view of the key's state. Failures are not cached, so a
    /// failed key reads as idle until the next resolve.
    pub fn status(&self, key: &K) -> QueryState<V> {
        if let Some(value) = self.entries.peek_fresh(key) {
            return QueryState::Ready(value);
        }
        if self.in_flight.contains_key(key) {
            return QueryState::Loading;
        }
        QueryState::Idle
    }

    /// Mutation write-through: replace the entry for `key` with `value`.
    pub fn store(&self, key: K, value: V) {
        debug!(kind = self.kind, ?key, "cache write-through");
        self.entries.put(key, value);
    }

    pub fn invalidate(&self, key: &K) {
        self.entries.invalidate(key);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    fn join_or_start<F, Fut>(&self, key: K, fetch: F) -> SharedFetch<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, SourceError>> + Send + 'static,
    {
        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(occupied) => {
                counter!("ammesso_cache_join_total", "kind" => self.kind).increment(1);
                occupied.get().clone()
            }
            Entry::Vacant(vacant) => {
                let entries = Arc::clone(&self.entries);
                let in_flight = Arc::clone(&self.in_flight);
                let task_key = key;
                let started = Instant::now();
                let fut = fetch();

                // The task waits for the gate so it cannot finish (and try to
                // deregister itself) before the shared handle is registered.
                let (gate_tx, gate_rx) = oneshot::channel::<()>();
                let handle = tokio::spawn(async move {
                    let _ = gate_rx.await;
                    let deregister = Deregister {
                        in_flight,
                        key: task_key,
                    };
                    let result = fut.await.map_err(Arc::new);
                    if let Ok(value) = &result {
                        entries.put_unless_newer(deregister.key.clone(), value.clone(), started);
                    }
                    result
                });

                let shared = async move {
                    match handle.await {
                        Ok(result) => result,
                        Err(join_error) => Err(Arc::new(SourceError::Task(join_error.to_string()))),
                    }
                }
                .boxed()
                .shared();

                vacant.insert(shared.clone());
                let _ = gate_tx.send(());
                shared
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::future::join_all;

    use crate::domain::ResourceKind;

    use super::*;

    fn cache(stale_after: Option<Duration>) -> ResourceCache<String, String> {
        ResourceCache::new(
            "school",
            NonZeroUsize::new(8).expect("non-zero capacity"),
            stale_after,
        )
    }

    #[tokio::test]
    async fn concurrent_resolvers_share_one_fetch() {
        let cache = cache(None);
        let calls = Arc::new(AtomicUsize::new(0));

        let resolvers = (0..5).map(|_| {
            let calls = Arc::clone(&calls);
            cache.resolve("school-42".to_string(), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(30)).await;
                Ok("Oakridge".to_string())
            })
        });

        let results = join_all(resolvers).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(result.expect("resolved"), "Oakridge");
        }
    }

    #[tokio::test]
    async fn distinct_keys_fetch_independently() {
        let cache = cache(None);
        let calls = Arc::new(AtomicUsize::new(0));

        for key in ["school-1", "school-2"] {
            let calls = Arc::clone(&calls);
            let value = cache
                .resolve(key.to_string(), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(format!("name of {key}"))
                })
                .await
                .expect("resolved");
            assert_eq!(value, format!("name of {key}"));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fresh_entry_skips_the_fetch() {
        let cache = cache(None);
        let calls = Arc::new(AtomicUsize::new(0));

        cache.store("school-42".to_string(), "Oakridge".to_string());

        let calls_in_fetch = Arc::clone(&calls);
        let value = cache
            .resolve("school-42".to_string(), move || async move {
                calls_in_fetch.fetch_add(1, Ordering::SeqCst);
                Ok("never".to_string())
            })
            .await
            .expect("resolved");

        assert_eq!(value, "Oakridge");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn mid_flight_write_wins_over_fetch_result() {
        let cache = Arc::new(cache(None));

        let resolver = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .resolve("school-42".to_string(), || async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok("from-fetch".to_string())
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.store("school-42".to_string(), "from-write".to_string());

        let resolved = resolver.await.expect("task joined").expect("resolved");
        assert_eq!(resolved, "from-write");

        // The late fetch completion must not clobber the write.
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(
            cache.status(&"school-42".to_string()).value(),
            Some(&"from-write".to_string())
        );
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = cache(None);
        let calls = Arc::new(AtomicUsize::new(0));

        for attempt in 0..2 {
            let calls = Arc::clone(&calls);
            let result = cache
                .resolve("school-42".to_string(), move || async move {
                    let call = calls.fetch_add(1, Ordering::SeqCst);
                    if call == 0 {
                        Err(SourceError::status(ResourceKind::School, "school-42", 500))
                    } else {
                        Ok("Oakridge".to_string())
                    }
                })
                .await;

            if attempt == 0 {
                let error = result.expect_err("first attempt fails");
                assert!(matches!(
                    *error,
                    SourceError::Status { status: 500, .. }
                ));
            } else {
                assert_eq!(result.expect("second attempt succeeds"), "Oakridge");
            }
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn status_reports_loading_then_ready() {
        let cache = Arc::new(cache(None));
        let key = "school-42".to_string();

        assert!(cache.status(&key).is_idle());

        let resolver = {
            let cache = Arc::clone(&cache);
            let key = key.clone();
            tokio::spawn(async move {
                cache
                    .resolve(key, || async {
                        tokio::time::sleep(Duration::from_millis(40)).await;
                        Ok("Oakridge".to_string())
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(cache.status(&key).is_loading());

        resolver.await.expect("task joined").expect("resolved");
        assert_eq!(cache.status(&key).value(), Some(&"Oakridge".to_string()));
    }

    #[tokio::test]
    async fn dropped_resolver_still_populates_the_cache() {
        let cache = Arc::new(cache(None));
        let calls = Arc::new(AtomicUsize::new(0));

        let abandoned = {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                cache
                    .resolve("school-42".to_string(), move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        Ok("Oakridge".to_string())
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(5)).await;
        abandoned.abort();

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(
            cache.status(&"school-42".to_string()).value(),
            Some(&"Oakridge".to_string())
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn panicking_fetch_frees_the_key_for_refetch() {
        let cache = cache(None);
        let key = "school-42".to_string();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = {
            let calls = Arc::clone(&calls);
            cache
                .resolve(key.clone(), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    panic!("fetch blew up");
                })
                .await
        };
        let error = first.expect_err("panicking fetch fails the resolve");
        assert!(matches!(*error, SourceError::Task(_)));

        // The key must be deregistered, not wedged as perpetually loading.
        assert!(cache.status(&key).is_idle());

        let second = {
            let calls = Arc::clone(&calls);
            cache
                .resolve(key.clone(), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("Oakridge".to_string())
                })
                .await
        };
        assert_eq!(second.expect("second resolve succeeds"), "Oakridge");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.status(&key).value(), Some(&"Oakridge".to_string()));
    }

    #[tokio::test]
    async fn stale_entry_triggers_a_refetch() {
        let cache = cache(Some(Duration::from_millis(10)));
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            cache
                .resolve("school-42".to_string(), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("Oakridge".to_string())
                })
                .await
                .expect("resolved");
            tokio::time::sleep(Duration::from_millis(25)).await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
