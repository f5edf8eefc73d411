// Site statistics widget.
// API call and install counters, plus the blueprint extension count feeding the project total.

use async_trait::async_trait;

use crate::cache::Namespace;
use crate::error::FetchError;
use crate::hydrator::Fetch;
use crate::site::{SiteClient, StatsDocument};

pub const NAMESPACE: Namespace = Namespace::single("siteStatsCache", 1);

pub struct StatsFetcher {
    client: SiteClient,
}

impl StatsFetcher {
    pub fn new(client: SiteClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetch<StatsDocument> for StatsFetcher {
    async fn fetch(&self, _key: &str) -> Result<StatsDocument, FetchError> {
        self.client.get_stats().await
    }
}
