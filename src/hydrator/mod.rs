// Stale-while-revalidate hydration.
// Paints from the persistent cache, then revalidates through the guard, the deduplicator and the retry policy.

pub mod outcome;
pub mod view;

pub use outcome::{Origin, Outcome};
pub use view::{Failure, Fetch, FnFetch, View, fetch_fn};

use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{DEFAULT_TTL, Namespace, PersistentCache};
use crate::dedup::RequestDeduplicator;
use crate::error::{FetchError, Result};
use crate::guard::{RateLimitGuard, Upstream};
use crate::retry::{RetryConfig, with_retry};

/// Payload types a hydrator can cache and share between callers.
pub trait Payload: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> Payload for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// Hydrates one resource kind (one cache namespace).
///
/// Build one per widget with [`Hydrator::builder`], sharing the process-wide
/// [`PersistentCache`] and [`RateLimitGuard`].
pub struct Hydrator<T> {
    namespace: Namespace,
    upstream: Upstream,
    ttl: Duration,
    retry: RetryConfig,
    fetcher: Arc<dyn Fetch<T>>,
    cache: Arc<PersistentCache>,
    guard: Arc<RateLimitGuard>,
    dedup: RequestDeduplicator<T>,
}

impl<T: Payload> Hydrator<T> {
    pub fn builder(
        namespace: Namespace,
        upstream: Upstream,
        fetcher: impl Fetch<T> + 'static,
    ) -> HydratorBuilder<T> {
        HydratorBuilder {
            namespace,
            upstream,
            fetcher: Arc::new(fetcher),
            ttl: DEFAULT_TTL,
            retry: RetryConfig::default(),
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Hydrate `key` into `view`.
    ///
    /// A cached entry (fresh or stale) is rendered first. Fresh entries end
    /// there. Otherwise the upstream is consulted unless the guard holds it
    /// back; a successful fetch is cached and rendered again. A failed
    /// revalidation never replaces a stale render with an error.
    pub async fn hydrate(&self, key: &str, view: &dyn View<T>) -> Outcome {
        let ns = self.namespace.name();
        let cached = self.cache.get::<T>(&self.namespace, key);

        if let Some(entry) = &cached {
            view.render(&entry.payload);
            if entry.is_fresh(self.cache.now()) {
                debug!(namespace = ns, key, "cache fresh, skipping fetch");
                return Outcome::Fresh {
                    origin: Origin::Cache,
                };
            }
            let age_ms = entry.age(self.cache.now()).as_millis() as u64;
            debug!(namespace = ns, key, age_ms, "cache stale, revalidating");
        }
        let stale_shown = cached.is_some();

        if self.guard.is_limited(self.upstream) {
            let reset_at = self.guard.reset_at(self.upstream);
            info!(namespace = ns, key, upstream = %self.upstream, "skipping fetch while rate limited");
            view.on_error(&Failure::RateLimited { reset_at });
            return Outcome::RateLimited {
                reset_at,
                stale_shown,
            };
        }

        match self.revalidate(key).await {
            Ok(payload) => {
                view.render(&payload);
                Outcome::Fresh {
                    origin: Origin::Network,
                }
            }
            Err(error) if stale_shown => {
                warn!(namespace = ns, key, %error, "revalidation failed, keeping stale data");
                Outcome::Stale { error }
            }
            Err(FetchError::RateLimited { reset_at }) => {
                view.on_error(&Failure::RateLimited { reset_at });
                Outcome::RateLimited {
                    reset_at,
                    stale_shown: false,
                }
            }
            Err(error) => {
                warn!(namespace = ns, key, %error, "hydration failed");
                view.on_error(&Failure::Unavailable(error.clone()));
                Outcome::Failed(error)
            }
        }
    }

    /// Fire-and-forget variant of [`hydrate`](Self::hydrate).
    pub fn spawn(self: &Arc<Self>, key: impl Into<String>, view: Arc<dyn View<T>>) -> JoinHandle<Outcome> {
        let hydrator = Arc::clone(self);
        let key = key.into();
        tokio::spawn(async move { hydrator.hydrate(&key, view.as_ref()).await })
    }

    /// Fetch through the deduplicator. The cache write and the guard update
    /// happen once per fetch, inside the shared request.
    async fn revalidate(&self, key: &str) -> std::result::Result<T, FetchError> {
        let fetcher = Arc::clone(&self.fetcher);
        let cache = Arc::clone(&self.cache);
        let guard = Arc::clone(&self.guard);
        let namespace = self.namespace.clone();
        let upstream = self.upstream;
        let ttl = self.ttl;
        let retry = self.retry.clone();
        let owned_key = key.to_string();

        self.dedup
            .run(key, move || async move {
                let result = with_retry(&retry, &owned_key, || fetcher.fetch(&owned_key)).await;
                match &result {
                    Ok(payload) => cache.set(&namespace, &owned_key, payload, ttl),
                    Err(FetchError::RateLimited {
                        reset_at: Some(reset_at),
                    }) => guard.record_limit(upstream, *reset_at),
                    Err(_) => {}
                }
                result
            })
            .await
    }
}

/// Configures a [`Hydrator`].
pub struct HydratorBuilder<T> {
    namespace: Namespace,
    upstream: Upstream,
    fetcher: Arc<dyn Fetch<T>>,
    ttl: Duration,
    retry: RetryConfig,
}

impl<T: Payload> HydratorBuilder<T> {
    /// How long a fetched payload stays fresh. Default: 6 hours.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Register the namespace with `cache` and build the hydrator.
    pub fn build(
        self,
        cache: Arc<PersistentCache>,
        guard: Arc<RateLimitGuard>,
    ) -> Result<Hydrator<T>> {
        cache.register::<T>(&self.namespace)?;
        Ok(Hydrator {
            namespace: self.namespace,
            upstream: self.upstream,
            ttl: self.ttl,
            retry: self.retry,
            fetcher: self.fetcher,
            cache,
            guard,
            dedup: RequestDeduplicator::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::storage::MemoryStorage;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    const NS: Namespace = Namespace::keyed("hydratorTest", 1);

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl View<Vec<u32>> for Recorder {
        fn render(&self, payload: &Vec<u32>) {
            self.events.lock().unwrap().push(format!("render {payload:?}"));
        }

        fn on_error(&self, failure: &Failure) {
            self.events.lock().unwrap().push(format!("error {failure:?}"));
        }
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    struct Fixture {
        cache: Arc<PersistentCache>,
        guard: Arc<RateLimitGuard>,
        clock: Arc<ManualClock>,
        calls: Arc<AtomicU32>,
    }

    fn fixture() -> Fixture {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(1_000_000));
        Fixture {
            cache: Arc::new(PersistentCache::new(storage.clone(), clock.clone())),
            guard: Arc::new(RateLimitGuard::new(storage, clock.clone())),
            clock,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    fn hydrator(
        fx: &Fixture,
        result: std::result::Result<Vec<u32>, FetchError>,
    ) -> Hydrator<Vec<u32>> {
        let calls = fx.calls.clone();
        let fetcher = fetch_fn(move |_key: String| {
            let calls = calls.clone();
            let result = result.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                result
            }
        });
        Hydrator::builder(NS, Upstream::GITHUB, fetcher)
            .ttl(Duration::from_secs(60))
            .retry(RetryConfig::disabled())
            .build(fx.cache.clone(), fx.guard.clone())
            .unwrap()
    }

    #[tokio::test]
    async fn test_absent_fetches_caches_and_renders() {
        let fx = fixture();
        let h = hydrator(&fx, Ok(vec![1, 2]));
        let view = Recorder::default();

        let outcome = h.hydrate("a", &view).await;

        assert_eq!(
            outcome,
            Outcome::Fresh {
                origin: Origin::Network
            }
        );
        assert_eq!(view.events(), vec!["render [1, 2]"]);
        assert_eq!(fx.cache.get::<Vec<u32>>(&NS, "a").unwrap().payload, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_fetch() {
        let fx = fixture();
        fx.cache.set(&NS, "a", &vec![9], Duration::from_secs(60));
        let h = hydrator(&fx, Ok(vec![1]));
        let view = Recorder::default();

        let outcome = h.hydrate("a", &view).await;

        assert_eq!(
            outcome,
            Outcome::Fresh {
                origin: Origin::Cache
            }
        );
        assert_eq!(view.events(), vec!["render [9]"]);
        assert_eq!(fx.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stale_renders_twice_in_order() {
        let fx = fixture();
        fx.cache.set(&NS, "a", &vec![9], Duration::from_secs(60));
        fx.clock.advance(61_000);
        let h = hydrator(&fx, Ok(vec![1]));
        let view = Recorder::default();

        let outcome = h.hydrate("a", &view).await;

        assert!(outcome.is_fresh());
        assert_eq!(view.events(), vec!["render [9]", "render [1]"]);
    }

    #[tokio::test]
    async fn test_failure_keeps_stale_render() {
        let fx = fixture();
        fx.cache.set(&NS, "a", &vec![9], Duration::from_secs(60));
        fx.clock.advance(61_000);
        let h = hydrator(&fx, Err(FetchError::Network("down".into())));
        let view = Recorder::default();

        let outcome = h.hydrate("a", &view).await;

        assert_eq!(
            outcome,
            Outcome::Stale {
                error: FetchError::Network("down".into())
            }
        );
        assert_eq!(view.events(), vec!["render [9]"]);
        // Stale entry is still there for the next load.
        assert_eq!(fx.cache.get::<Vec<u32>>(&NS, "a").unwrap().payload, vec![9]);
    }

    #[tokio::test]
    async fn test_failure_without_cache_reports_error() {
        let fx = fixture();
        let h = hydrator(&fx, Err(FetchError::Malformed("eof".into())));
        let view = Recorder::default();

        let outcome = h.hydrate("a", &view).await;

        assert_eq!(outcome, Outcome::Failed(FetchError::Malformed("eof".into())));
        assert_eq!(view.events().len(), 1);
        assert!(view.events()[0].starts_with("error Unavailable"));
    }

    #[tokio::test]
    async fn test_empty_result_is_cached_as_fresh() {
        let fx = fixture();
        let h = hydrator(&fx, Ok(vec![]));
        let view = Recorder::default();

        h.hydrate("a", &view).await;
        let outcome = h.hydrate("a", &view).await;

        assert_eq!(
            outcome,
            Outcome::Fresh {
                origin: Origin::Cache
            }
        );
        assert_eq!(fx.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_signal_trips_guard() {
        let fx = fixture();
        let reset_at = fx.clock.now_millis() + 30_000;
        let h = hydrator(
            &fx,
            Err(FetchError::RateLimited {
                reset_at: Some(reset_at),
            }),
        );
        let view = Recorder::default();

        let first = h.hydrate("a", &view).await;
        assert_eq!(
            first,
            Outcome::RateLimited {
                reset_at: Some(reset_at),
                stale_shown: false
            }
        );
        assert!(fx.guard.is_limited(Upstream::GITHUB));

        // Guard holds back the next call without fetching.
        let second = h.hydrate("b", &view).await;
        assert!(matches!(second, Outcome::RateLimited { .. }));
        assert_eq!(fx.calls.load(Ordering::SeqCst), 1);
        assert!(fx.cache.get::<Vec<u32>>(&NS, "b").is_none());
    }

    #[tokio::test]
    async fn test_ordinary_failure_does_not_trip_guard() {
        let fx = fixture();
        let h = hydrator(
            &fx,
            Err(FetchError::Status {
                status: 403,
                url: "https://api.github.com/x".into(),
            }),
        );

        h.hydrate("a", &Recorder::default()).await;
        assert!(!fx.guard.is_limited(Upstream::GITHUB));
    }

    #[tokio::test]
    async fn test_duplicate_namespace_registration_fails() {
        let fx = fixture();
        let _h = hydrator(&fx, Ok(vec![]));

        let other = Hydrator::<String>::builder(
            NS,
            Upstream::SITE,
            fetch_fn(|_key: String| async { Ok(String::new()) }),
        )
        .build(fx.cache.clone(), fx.guard.clone());
        assert!(other.is_err());
    }
}
