// Cache entry and freshness.
// An entry carries its own write time and TTL so callers can decide between fresh and stale.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Whether an entry is still inside its TTL window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
}

/// A cached payload with metadata.
///
/// Persisted as `{ "storedAt": .., "ttlMillis": .., "payload": .. }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    /// Resource key this entry was read under. Not persisted.
    #[serde(skip)]
    pub key: String,
    /// When the entry was written, epoch millis.
    pub stored_at: u64,
    /// How long the entry stays fresh.
    pub ttl_millis: u64,
    /// The cached value.
    pub payload: T,
}

impl<T> CacheEntry<T> {
    /// Create an entry written at `now`.
    pub fn new(key: impl Into<String>, payload: T, now: u64, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            stored_at: now,
            ttl_millis: ttl.as_millis().min(u64::MAX as u128) as u64,
            payload,
        }
    }

    /// Fresh while `now - stored_at < ttl_millis`.
    pub fn freshness(&self, now: u64) -> Freshness {
        if now.saturating_sub(self.stored_at) < self.ttl_millis {
            Freshness::Fresh
        } else {
            Freshness::Stale
        }
    }

    pub fn is_fresh(&self, now: u64) -> bool {
        self.freshness(now) == Freshness::Fresh
    }

    /// Age of the entry at `now`.
    pub fn age(&self, now: u64) -> Duration {
        Duration::from_millis(now.saturating_sub(self.stored_at))
    }
}
