// Release download resolution.
// Finds the best downloadable asset for a repository, falling back past a missing "latest" release.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FetchError;

use super::client::GitHubClient;
use super::types::ReleaseAsset;

/// How many releases to scan when `/releases/latest` is missing.
pub const FALLBACK_RELEASES: u32 = 10;

/// What a download button can link to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReleaseDownload {
    /// A downloadable asset.
    Asset { url: String, asset_name: String },
    /// A release exists but carries nothing downloadable.
    NoAsset,
    /// No usable release.
    NoRelease,
}

impl ReleaseDownload {
    fn from_assets(assets: &[ReleaseAsset]) -> Self {
        match pick_best_asset(assets) {
            Some((asset, url)) => ReleaseDownload::Asset {
                url: url.to_string(),
                asset_name: asset.name.clone(),
            },
            None => ReleaseDownload::NoAsset,
        }
    }
}

/// Pick the asset to offer: the first `.jar`, else the first `.zip`, else
/// the first asset with a download URL. Suffixes match case-insensitively.
pub fn pick_best_asset(assets: &[ReleaseAsset]) -> Option<(&ReleaseAsset, &str)> {
    let downloadable = || {
        assets.iter().filter_map(|asset| {
            asset
                .browser_download_url
                .as_deref()
                .filter(|url| !url.is_empty())
                .map(|url| (asset, url))
        })
    };
    let with_suffix = |suffix: &str| {
        downloadable().find(|(asset, _)| asset.name.to_lowercase().ends_with(suffix))
    };

    with_suffix(".jar")
        .or_else(|| with_suffix(".zip"))
        .or_else(|| downloadable().next())
}

impl GitHubClient {
    /// Resolve the download for `owner/repo`.
    ///
    /// Prefers `/releases/latest`. When that is 404 (repositories that only
    /// publish prereleases), scans the most recent releases for the first
    /// non-draft one. Rate-limit signals propagate; any other failure of the
    /// fallback list means there is no release to offer.
    pub async fn get_release_download(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<ReleaseDownload, FetchError> {
        match self.get_latest_release(owner, repo).await {
            Ok(release) => Ok(ReleaseDownload::from_assets(&release.assets)),
            Err(FetchError::Status { status: 404, .. }) => {
                debug!(owner, repo, "no latest release, scanning release list");
                let releases = match self.get_releases(owner, repo, FALLBACK_RELEASES).await {
                    Ok(releases) => releases,
                    Err(e @ FetchError::RateLimited { .. }) => return Err(e),
                    Err(e) => {
                        debug!(owner, repo, error = %e, "release list unavailable");
                        return Ok(ReleaseDownload::NoRelease);
                    }
                };

                Ok(releases
                    .iter()
                    .find(|release| !release.draft)
                    .map(|release| ReleaseDownload::from_assets(&release.assets))
                    .unwrap_or(ReleaseDownload::NoRelease))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str, url: Option<&str>) -> ReleaseAsset {
        ReleaseAsset {
            name: name.to_string(),
            browser_download_url: url.map(str::to_string),
        }
    }

    #[test]
    fn test_prefers_jar_over_zip() {
        let assets = vec![
            asset("source.zip", Some("https://x/source.zip")),
            asset("Plugin.JAR", Some("https://x/plugin.jar")),
        ];
        let (best, url) = pick_best_asset(&assets).unwrap();
        assert_eq!(best.name, "Plugin.JAR");
        assert_eq!(url, "https://x/plugin.jar");
    }

    #[test]
    fn test_zip_before_other() {
        let assets = vec![
            asset("notes.txt", Some("https://x/notes.txt")),
            asset("bundle.zip", Some("https://x/bundle.zip")),
        ];
        assert_eq!(pick_best_asset(&assets).unwrap().0.name, "bundle.zip");
    }

    #[test]
    fn test_any_downloadable_as_last_resort() {
        let assets = vec![
            asset("plugin.jar", None),
            asset("plugin.whl", Some("https://x/plugin.whl")),
        ];
        assert_eq!(pick_best_asset(&assets).unwrap().0.name, "plugin.whl");
    }

    #[test]
    fn test_nothing_downloadable() {
        let assets = vec![asset("plugin.jar", None), asset("a.zip", Some(""))];
        assert!(pick_best_asset(&assets).is_none());
        assert_eq!(ReleaseDownload::from_assets(&assets), ReleaseDownload::NoAsset);
    }

    #[test]
    fn test_serialized_kind_tag() {
        let json = serde_json::to_value(ReleaseDownload::NoRelease).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "no_release" }));
    }
}
