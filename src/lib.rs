//! hydrant - cache-aside hydration for page widgets
//!
//! Widgets are painted from a persistent, TTL-versioned cache first and
//! revalidated in the background (stale-while-revalidate). Upstream calls
//! are deduplicated per key, retried on transient failures, and held back
//! while an upstream's rate limit is exhausted. Widgets that contribute to a
//! shared total publish their counts on an [`AggregationBus`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use hydrant::{
//!     Failure, FetchError, Hydrator, MemoryStorage, Namespace, PersistentCache,
//!     RateLimitGuard, SystemClock, Upstream, View, fetch_fn,
//! };
//!
//! struct Print;
//!
//! impl View<u64> for Print {
//!     fn render(&self, count: &u64) {
//!         println!("{count}");
//!     }
//!
//!     fn on_error(&self, failure: &Failure) {
//!         eprintln!("{failure:?}");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> hydrant::Result<()> {
//!     let storage = Arc::new(MemoryStorage::new());
//!     let clock = Arc::new(SystemClock);
//!     let cache = Arc::new(PersistentCache::new(storage.clone(), clock.clone()));
//!     let guard = Arc::new(RateLimitGuard::new(storage, clock));
//!
//!     let hydrator = Hydrator::builder(
//!         Namespace::single("answer", 1),
//!         Upstream::new("example"),
//!         fetch_fn(|_key: String| async { Ok::<_, FetchError>(42u64) }),
//!     )
//!     .build(cache, guard)?;
//!
//!     let outcome = hydrator.hydrate("answer", &Print).await;
//!     println!("{}", outcome.label());
//!     Ok(())
//! }
//! ```

pub mod bus;
pub mod cache;
pub mod clock;
pub mod config;
pub mod dedup;
pub mod error;
pub mod github;
pub mod guard;
pub mod hydrator;
pub mod retry;
pub mod site;
pub mod storage;
pub mod widgets;

pub use bus::{AggregationBus, Source, Total};
pub use cache::{CacheEntry, Freshness, Namespace, PersistentCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use dedup::RequestDeduplicator;
pub use error::{FetchError, HydrantError, Result, StorageError};
pub use guard::{RateLimitGuard, Upstream};
pub use hydrator::{Failure, Fetch, Hydrator, Origin, Outcome, View, fetch_fn};
pub use retry::{RetryConfig, with_retry};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use widgets::Widgets;

/// Package version, for the CLI and the default user agent.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
