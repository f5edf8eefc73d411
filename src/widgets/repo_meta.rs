// Web app repository metadata.
// Language, stars, forks and last update for each showcased repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::Namespace;
use crate::error::FetchError;
use crate::github::{GitHubClient, Repository};
use crate::hydrator::Fetch;

pub const NAMESPACE: Namespace = Namespace::keyed("webAppsGithubRepoMetaCache", 2);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoMeta {
    pub language: String,
    pub stars: u64,
    pub forks: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Repository> for RepoMeta {
    fn from(repo: Repository) -> Self {
        Self {
            language: repo
                .language
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            updated_at: repo.updated_at,
        }
    }
}

/// Fetches metadata for an `owner/repo` key.
pub struct RepoMetaFetcher {
    client: GitHubClient,
}

impl RepoMetaFetcher {
    pub fn new(client: GitHubClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetch<RepoMeta> for RepoMetaFetcher {
    async fn fetch(&self, repo_path: &str) -> Result<RepoMeta, FetchError> {
        if repo_path.trim().is_empty() {
            return Err(FetchError::Malformed("missing repository path".to_string()));
        }
        Ok(self.client.get_repo(repo_path).await?.into())
    }
}
