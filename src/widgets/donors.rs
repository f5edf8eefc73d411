// Donor list widget.

use async_trait::async_trait;

use crate::cache::Namespace;
use crate::error::FetchError;
use crate::hydrator::Fetch;
use crate::site::{Donor, SiteClient};

pub const NAMESPACE: Namespace = Namespace::single("donatorsCache", 1);

pub struct DonorsFetcher {
    client: SiteClient,
}

impl DonorsFetcher {
    pub fn new(client: SiteClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetch<Vec<Donor>> for DonorsFetcher {
    async fn fetch(&self, _key: &str) -> Result<Vec<Donor>, FetchError> {
        self.client.get_donors().await
    }
}
