// In-flight request deduplication.
// At most one outstanding fetch per key; concurrent callers share its result.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::debug;

use crate::error::FetchError;

/// A pending fetch result that any number of callers can await.
pub type SharedFetch<T> = Shared<BoxFuture<'static, Result<T, FetchError>>>;

type InFlightMap<T> = HashMap<String, (u64, SharedFetch<T>)>;

/// Collapses concurrent fetches for the same key into one.
///
/// The fetch runs on its own task so it settles even when every caller
/// stops waiting. The key is removed from the in-flight map inside that
/// task, before the result is handed to any caller, so a call made after
/// settlement always starts a new fetch.
pub struct RequestDeduplicator<T> {
    in_flight: Arc<Mutex<InFlightMap<T>>>,
    next_id: AtomicU64,
}

impl<T> Default for RequestDeduplicator<T> {
    fn default() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<T> RequestDeduplicator<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the in-flight fetch for `key`, or start one with `fetch`.
    ///
    /// `fetch` is only invoked when no request for `key` is outstanding.
    /// Must be called from within a Tokio runtime.
    pub fn run<F, Fut>(&self, key: &str, fetch: F) -> SharedFetch<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let mut map = lock(&self.in_flight);
        if let Some((_, pending)) = map.get(key) {
            debug!(key, "joining in-flight request");
            return pending.clone();
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let in_flight = Arc::clone(&self.in_flight);
        let owned_key = key.to_string();
        let request = fetch();

        // The map lock is held until the entry is inserted, so the removal
        // below can never run before the insert.
        let task = tokio::spawn(async move {
            let result = request.await;
            let mut map = lock(&in_flight);
            if map.get(&owned_key).is_some_and(|(entry_id, _)| *entry_id == id) {
                map.remove(&owned_key);
            }
            result
        });

        let pending = async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(FetchError::Network(format!("fetch task failed: {e}"))),
            }
        }
        .boxed()
        .shared();

        debug!(key, "starting request");
        map.insert(key.to_string(), (id, pending.clone()));
        pending
    }

    /// Whether a request for `key` is outstanding.
    pub fn in_flight(&self, key: &str) -> bool {
        lock(&self.in_flight).contains_key(key)
    }

    /// Number of outstanding requests.
    pub fn len(&self) -> usize {
        lock(&self.in_flight).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let dedup = RequestDeduplicator::<u32>::new();
        let calls = Arc::new(AtomicU32::new(0));
        let (release, gate) = oneshot::channel::<()>();
        let mut gate = Some(gate);

        let mut pending = Vec::new();
        for _ in 0..5 {
            let calls = calls.clone();
            let gate = gate.take();
            pending.push(dedup.run("repo", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                Ok(7)
            }));
        }

        assert!(dedup.in_flight("repo"));
        release.send(()).unwrap();

        let results = futures_util::future::join_all(pending).await;
        assert!(results.iter().all(|r| *r == Ok(7)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!dedup.in_flight("repo"));
    }

    #[tokio::test]
    async fn test_failure_is_shared_and_cleared() {
        let dedup = RequestDeduplicator::<u32>::new();

        let a = dedup.run("k", || async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Err(FetchError::Network("boom".into()))
        });
        let b = dedup.run("k", || async { Ok(1) });

        assert_eq!(a.await, Err(FetchError::Network("boom".into())));
        assert_eq!(b.await, Err(FetchError::Network("boom".into())));
        assert!(dedup.is_empty());

        // After settlement a new fetch starts.
        let c = dedup.run("k", || async { Ok(2) });
        assert_eq!(c.await, Ok(2));
    }

    #[tokio::test]
    async fn test_distinct_keys_run_independently() {
        let dedup = RequestDeduplicator::<&'static str>::new();

        let a = dedup.run("a", || async { Ok("a") });
        let b = dedup.run("b", || async { Ok("b") });

        assert_eq!(a.await, Ok("a"));
        assert_eq!(b.await, Ok("b"));
    }

    #[tokio::test]
    async fn test_fetch_settles_without_waiters() {
        let dedup = RequestDeduplicator::<u32>::new();
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        drop(dedup.run("k", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        }));

        for _ in 0..50 {
            if dedup.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        assert!(dedup.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
