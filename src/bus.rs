//! Cross-widget count aggregation.
//!
//! Widgets publish their latest count under a typed [`Source`]; the bus keeps
//! the most recent value per source and broadcasts the recomputed sum. A
//! source that never publishes contributes 0, and late subscribers can read
//! [`AggregationBus::total`] at any time.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

/// A widget that contributes to the combined total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Source(&'static str);

impl Source {
    pub const ENDSTONE_PLUGINS: Source = Source("endstone-plugins");
    pub const BLUEPRINT_EXTENSIONS: Source = Source("blueprint-extensions");
    pub const WEB_APPS: Source = Source("web-apps");

    pub const fn new(name: &'static str) -> Self {
        Source(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Broadcast after every publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Total {
    /// Who published.
    pub source: Source,
    /// What they published.
    pub value: u64,
    /// Sum of the latest value of every source.
    pub total: u64,
}

/// Publish/subscribe channel for per-source counts.
pub struct AggregationBus {
    counts: Mutex<HashMap<Source, u64>>,
    tx: broadcast::Sender<Total>,
}

impl Default for AggregationBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl AggregationBus {
    /// Create a bus buffering up to `capacity` updates per slow subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self {
            counts: Mutex::new(HashMap::new()),
            tx,
        }
    }

    /// Replace `source`'s count with `value` and broadcast the new total.
    pub fn publish(&self, source: Source, value: u64) -> u64 {
        let mut counts = self.counts();
        counts.insert(source, value);
        let total = counts.values().sum();

        // Sent under the lock so subscribers see totals in publish order.
        let update = Total {
            source,
            value,
            total,
        };
        match self.tx.send(update) {
            Ok(receivers) => debug!(%source, value, total, receivers, "published count"),
            Err(_) => debug!(%source, value, total, "published count, no subscribers"),
        }
        total
    }

    /// Receive every future update.
    pub fn subscribe(&self) -> broadcast::Receiver<Total> {
        self.tx.subscribe()
    }

    /// Call `callback` with every future update until the bus is dropped.
    ///
    /// A subscriber that falls behind skips to the newest updates; totals are
    /// absolute, so nothing is lost by skipping.
    pub fn subscribe_with<F>(&self, mut callback: F) -> JoinHandle<()>
    where
        F: FnMut(Total) + Send + 'static,
    {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(update) => callback(update),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "aggregation subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Current combined total.
    pub fn total(&self) -> u64 {
        self.counts().values().sum()
    }

    /// Latest value from `source`, if it has published.
    pub fn value(&self, source: Source) -> Option<u64> {
        self.counts().get(&source).copied()
    }

    fn counts(&self) -> MutexGuard<'_, HashMap<Source, u64>> {
        self.counts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    const A: Source = Source::new("a");
    const B: Source = Source::new("b");

    #[test]
    fn test_last_value_per_source_wins() {
        let bus = AggregationBus::default();
        bus.publish(A, 3);
        bus.publish(B, 5);
        let total = bus.publish(A, 7);

        assert_eq!(total, 12);
        assert_eq!(bus.total(), 12);
        assert_eq!(bus.value(A), Some(7));
    }

    #[test]
    fn test_silent_source_counts_as_zero() {
        let bus = AggregationBus::default();
        assert_eq!(bus.total(), 0);
        assert_eq!(bus.value(B), None);

        bus.publish(A, 4);
        assert_eq!(bus.total(), 4);
    }

    #[test]
    fn test_publish_order_does_not_matter() {
        let first = AggregationBus::default();
        first.publish(A, 1);
        first.publish(B, 2);

        let second = AggregationBus::default();
        second.publish(B, 2);
        second.publish(A, 1);

        assert_eq!(first.total(), second.total());
    }

    #[tokio::test]
    async fn test_subscriber_receives_totals() {
        let bus = AggregationBus::default();
        let mut rx = bus.subscribe();

        bus.publish(A, 3);
        bus.publish(B, 5);
        bus.publish(A, 7);

        let totals: Vec<u64> = vec![
            rx.recv().await.unwrap().total,
            rx.recv().await.unwrap().total,
            rx.recv().await.unwrap().total,
        ];
        assert_eq!(totals, vec![3, 8, 12]);
    }

    #[tokio::test]
    async fn test_late_subscriber_reads_current_total() {
        let bus = Arc::new(AggregationBus::default());
        bus.publish(A, 10);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _task = bus.subscribe_with(move |update| {
            let _ = tx.send(update.total);
        });

        assert_eq!(bus.total(), 10);
        bus.publish(B, 1);
        assert_eq!(rx.recv().await, Some(11));
    }
}
