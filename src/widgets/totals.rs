// Project total.
// Widgets that contribute to the total publish their counts through a counting view wrapper.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::bus::{AggregationBus, Source};
use crate::hydrator::{Failure, View};
use crate::site::StatsDocument;

use super::plugins::Plugin;

/// Wraps a view and publishes a count derived from every rendered payload.
///
/// A failure before anything was rendered publishes 0, so the total never
/// waits on a widget that has nothing to show. A failure after a render
/// keeps the last published count.
pub struct Counting<V, F> {
    inner: V,
    bus: Arc<AggregationBus>,
    source: Source,
    count: F,
    rendered: AtomicBool,
}

impl<V, F> Counting<V, F> {
    pub fn new(inner: V, bus: Arc<AggregationBus>, source: Source, count: F) -> Self {
        Self {
            inner,
            bus,
            source,
            count,
            rendered: AtomicBool::new(false),
        }
    }
}

impl<T, V, F> View<T> for Counting<V, F>
where
    V: View<T>,
    F: Fn(&T) -> u64 + Send + Sync,
{
    fn render(&self, payload: &T) {
        self.rendered.store(true, Ordering::SeqCst);
        self.bus.publish(self.source, (self.count)(payload));
        self.inner.render(payload);
    }

    fn on_error(&self, failure: &Failure) {
        if !self.rendered.load(Ordering::SeqCst) {
            self.bus.publish(self.source, 0);
        }
        self.inner.on_error(failure);
    }
}

/// Publishes the plugin count.
pub fn counting_plugins<V: View<Vec<Plugin>>>(
    inner: V,
    bus: Arc<AggregationBus>,
) -> Counting<V, fn(&Vec<Plugin>) -> u64> {
    let count: fn(&Vec<Plugin>) -> u64 = |plugins| plugins.len() as u64;
    Counting::new(inner, bus, Source::ENDSTONE_PLUGINS, count)
}

/// Publishes the blueprint extension count.
pub fn counting_stats<V: View<StatsDocument>>(
    inner: V,
    bus: Arc<AggregationBus>,
) -> Counting<V, fn(&StatsDocument) -> u64> {
    let count: fn(&StatsDocument) -> u64 = |stats| stats.blueprint_count();
    Counting::new(inner, bus, Source::BLUEPRINT_EXTENSIONS, count)
}

/// Web apps are configured, not fetched; their count is published directly.
pub fn publish_web_apps(bus: &AggregationBus, web_apps: &[String]) -> u64 {
    bus.publish(Source::WEB_APPS, web_apps.len() as u64)
}
