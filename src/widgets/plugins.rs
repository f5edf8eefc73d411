// Endstone plugins widget.
// Lists an organization's plugin repositories, identified by a name suffix.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::Namespace;
use crate::error::FetchError;
use crate::github::{GitHubClient, Repository};
use crate::hydrator::Fetch;

/// One entry per organization.
pub const NAMESPACE: Namespace = Namespace::keyed("endstonePluginsCache", 3);

/// Page size for the organization listing.
const ORG_REPOS_PER_PAGE: u32 = 100;

/// The fields of a plugin repository the page renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugin {
    pub name: String,
    pub display_name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub language: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Plugin {
    fn from_repo(repo: Repository, suffix: &str) -> Self {
        Self {
            display_name: display_name(&repo.name, suffix),
            name: repo.name,
            html_url: repo.html_url,
            description: repo.description.filter(|d| !d.trim().is_empty()),
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            language: repo.language,
            updated_at: repo.updated_at,
        }
    }
}

/// A live, non-fork repository whose name ends with `suffix`.
pub fn is_plugin_repo(repo: &Repository, suffix: &str) -> bool {
    !repo.archived && !repo.fork && ends_with_ignore_case(&repo.name, suffix)
}

/// `Thing-Endstone` → `Thing`.
pub fn display_name(name: &str, suffix: &str) -> String {
    if ends_with_ignore_case(name, suffix) {
        name[..name.len() - suffix.len()].to_string()
    } else {
        name.to_string()
    }
}

fn ends_with_ignore_case(name: &str, suffix: &str) -> bool {
    name.len() >= suffix.len()
        && name.is_char_boundary(name.len() - suffix.len())
        && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

/// Fetches the plugin list of the organization named by the item key.
pub struct PluginsFetcher {
    client: GitHubClient,
    suffix: String,
}

impl PluginsFetcher {
    pub fn new(client: GitHubClient, suffix: impl Into<String>) -> Self {
        Self {
            client,
            suffix: suffix.into(),
        }
    }
}

#[async_trait]
impl Fetch<Vec<Plugin>> for PluginsFetcher {
    async fn fetch(&self, org: &str) -> Result<Vec<Plugin>, FetchError> {
        let repos = self.client.get_org_repos(org, ORG_REPOS_PER_PAGE).await?;
        Ok(repos
            .into_iter()
            .filter(|repo| is_plugin_repo(repo, &self.suffix))
            .map(|repo| Plugin::from_repo(repo, &self.suffix))
            .collect())
    }
}
