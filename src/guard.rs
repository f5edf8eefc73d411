// Rate-limit guard.
// Remembers when each upstream may be called again after an authoritative quota-exhaustion signal.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::storage::Storage;

/// Storage key for persisted reset times.
pub const GUARD_STORAGE_KEY: &str = "rateLimitGuard:v1";

/// An upstream API sharing one request quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Upstream(&'static str);

impl Upstream {
    /// api.github.com; every GitHub-backed widget draws from the same anonymous quota.
    pub const GITHUB: Upstream = Upstream("github");
    /// The site's own API (statistics, donors).
    pub const SITE: Upstream = Upstream("site");

    pub const fn new(name: &'static str) -> Self {
        Upstream(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Tracks a "retry not before" time per upstream.
///
/// Reset times only ever move forward. State is loaded from storage once
/// and written back on every change; unreadable state means "not limited".
pub struct RateLimitGuard {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    reset_at: Mutex<HashMap<String, u64>>,
}

impl RateLimitGuard {
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        let reset_at = load(storage.as_ref());
        Self {
            storage,
            clock,
            reset_at: Mutex::new(reset_at),
        }
    }

    /// Whether requests to `upstream` must be held back right now.
    pub fn is_limited(&self, upstream: Upstream) -> bool {
        self.reset_at(upstream)
            .is_some_and(|reset_at| self.clock.now_millis() < reset_at)
    }

    /// The recorded reset time for `upstream`, epoch millis.
    pub fn reset_at(&self, upstream: Upstream) -> Option<u64> {
        let map = self.reset_at.lock().ok()?;
        map.get(upstream.name()).copied().filter(|&t| t > 0)
    }

    /// Record an exhaustion signal. Earlier reset times never replace later ones.
    ///
    /// The state lock is held while persisting, so concurrent records reach
    /// storage in the order they were applied.
    pub fn record_limit(&self, upstream: Upstream, reset_at: u64) {
        let Ok(mut map) = self.reset_at.lock() else {
            warn!(%upstream, "rate-limit state lock poisoned");
            return;
        };
        let current = map.entry(upstream.name().to_string()).or_insert(0);
        if reset_at <= *current {
            debug!(%upstream, reset_at, current = *current, "ignoring older rate-limit reset");
            return;
        }
        *current = reset_at;

        info!(%upstream, reset_at, "upstream rate limited");

        match serde_json::to_string(&*map) {
            Ok(json) => {
                if let Err(e) = self.storage.set(GUARD_STORAGE_KEY, &json) {
                    warn!(error = %e, "failed to persist rate-limit state");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize rate-limit state"),
        }
    }
}

fn load(storage: &dyn Storage) -> HashMap<String, u64> {
    match storage.get(GUARD_STORAGE_KEY) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            debug!(error = %e, "discarding unreadable rate-limit state");
            HashMap::new()
        }),
        Ok(None) => HashMap::new(),
        Err(e) => {
            debug!(error = %e, "rate-limit state unavailable");
            HashMap::new()
        }
    }
}
