// GitHub API endpoint functions.
// Typed methods for the repository and release lookups the widgets hydrate from.

use crate::error::FetchError;

use super::client::GitHubClient;
use super::types::{Release, Repository};

type Result<T> = std::result::Result<T, FetchError>;

impl GitHubClient {
    /// Get repositories for an organization, most recently updated first.
    pub async fn get_org_repos(&self, org: &str, per_page: u32) -> Result<Vec<Repository>> {
        let params = [("per_page", per_page.to_string()), ("sort", "updated".to_string())];
        let response = self
            .get_with_params(&format!("/orgs/{}/repos", org), &params)
            .await?;
        let repos: Vec<Repository> = response.json().await?;
        Ok(repos)
    }

    /// Get a specific repository by `owner/repo` path.
    pub async fn get_repo(&self, repo_path: &str) -> Result<Repository> {
        let response = self.get(&format!("/repos/{}", repo_path)).await?;
        let repository: Repository = response.json().await?;
        Ok(repository)
    }

    /// Get the latest published, non-prerelease release.
    pub async fn get_latest_release(&self, owner: &str, repo: &str) -> Result<Release> {
        let response = self
            .get(&format!("/repos/{}/{}/releases/latest", owner, repo))
            .await?;
        let release: Release = response.json().await?;
        Ok(release)
    }

    /// Get the most recent releases, including drafts visible to the caller and prereleases.
    pub async fn get_releases(&self, owner: &str, repo: &str, per_page: u32) -> Result<Vec<Release>> {
        let params = [("per_page", per_page.to_string())];
        let response = self
            .get_with_params(&format!("/repos/{}/{}/releases", owner, repo), &params)
            .await?;
        let releases: Vec<Release> = response.json().await?;
        Ok(releases)
    }
}
