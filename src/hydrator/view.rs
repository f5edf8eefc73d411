// Fetch and render seams.
// The hydrator never knows what a payload looks like: fetching and drawing are supplied by the caller.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::error::FetchError;

/// Loads the payload for a key from its upstream.
#[async_trait]
pub trait Fetch<T>: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<T, FetchError>;
}

/// Adapts an async closure into a [`Fetch`] implementation.
pub struct FnFetch<F, T> {
    f: F,
    _payload: PhantomData<fn() -> T>,
}

/// Build a fetcher from `|key: String| async move { .. }`.
pub fn fetch_fn<F, Fut, T>(f: F) -> FnFetch<F, T>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, FetchError>> + Send,
{
    FnFetch {
        f,
        _payload: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, T> Fetch<T> for FnFetch<F, T>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, FetchError>> + Send,
    T: Send,
{
    async fn fetch(&self, key: &str) -> Result<T, FetchError> {
        (self.f)(key.to_string()).await
    }
}

/// Why a widget has nothing (new) to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The upstream quota is exhausted.
    RateLimited { reset_at: Option<u64> },
    /// Any other failure: network, HTTP status, unparseable body.
    Unavailable(FetchError),
}

/// Receives payloads and failures for one widget.
///
/// `render` may be called twice per hydration (cached, then revalidated)
/// and must tolerate that.
pub trait View<T>: Send + Sync {
    fn render(&self, payload: &T);

    fn on_error(&self, failure: &Failure);
}
