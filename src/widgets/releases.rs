// Plugin download buttons.
// One cached release lookup per plugin repository.

use async_trait::async_trait;

use crate::cache::Namespace;
use crate::error::FetchError;
use crate::github::{GitHubClient, ReleaseDownload};
use crate::hydrator::Fetch;

pub const NAMESPACE: Namespace = Namespace::keyed("endstoneReleaseDownloadsCache", 2);

/// Resolves the download for a repository (the hydration key) in one organization.
pub struct ReleasesFetcher {
    client: GitHubClient,
    org: String,
}

impl ReleasesFetcher {
    pub fn new(client: GitHubClient, org: impl Into<String>) -> Self {
        Self {
            client,
            org: org.into(),
        }
    }
}

#[async_trait]
impl Fetch<ReleaseDownload> for ReleasesFetcher {
    async fn fetch(&self, repo: &str) -> Result<ReleaseDownload, FetchError> {
        self.client.get_release_download(&self.org, repo).await
    }
}
