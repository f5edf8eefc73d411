// Widget wiring.
// One hydrator per resource, built from configuration over the shared cache and guard.

pub mod donors;
pub mod plugins;
pub mod releases;
pub mod repo_meta;
pub mod stats;
pub mod totals;

pub use plugins::Plugin;
pub use repo_meta::RepoMeta;
pub use totals::{Counting, counting_plugins, counting_stats, publish_web_apps};

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Namespace, PersistentCache};
use crate::config::{self, Config};
use crate::error::Result;
use crate::github::{GitHubClient, ReleaseDownload};
use crate::guard::{RateLimitGuard, Upstream};
use crate::hydrator::Hydrator;
use crate::site::{Donor, SiteClient, StatsDocument};

use self::donors::DonorsFetcher;
use self::plugins::PluginsFetcher;
use self::releases::ReleasesFetcher;
use self::repo_meta::RepoMetaFetcher;
use self::stats::StatsFetcher;

/// Every namespace the widgets write to.
pub const NAMESPACES: [Namespace; 5] = [
    plugins::NAMESPACE,
    releases::NAMESPACE,
    repo_meta::NAMESPACE,
    stats::NAMESPACE,
    donors::NAMESPACE,
];

/// The page's widgets.
pub struct Widgets {
    pub plugins: Arc<Hydrator<Vec<Plugin>>>,
    pub releases: Arc<Hydrator<ReleaseDownload>>,
    pub repo_meta: Arc<Hydrator<RepoMeta>>,
    pub stats: Arc<Hydrator<StatsDocument>>,
    pub donors: Arc<Hydrator<Vec<Donor>>>,
    org: String,
    web_apps: Vec<String>,
}

impl Widgets {
    /// Build clients from `config` and one hydrator per widget.
    ///
    /// The GitHub token, when set, is read from the environment.
    pub fn new(
        config: &Config,
        cache: Arc<PersistentCache>,
        guard: Arc<RateLimitGuard>,
    ) -> Result<Self> {
        let token = config::github_token();
        let github = GitHubClient::new(
            config.github.api_base.as_str(),
            token.as_deref(),
            &config.http.user_agent,
            config.http.timeout(),
        )?;
        let site = SiteClient::new(
            config.site.api_base.as_str(),
            &config.http.user_agent,
            config.http.timeout(),
        )?;
        Self::with_clients(config, github, site, cache, guard)
    }

    /// Like [`Widgets::new`], with caller-supplied clients.
    pub fn with_clients(
        config: &Config,
        github: GitHubClient,
        site: SiteClient,
        cache: Arc<PersistentCache>,
        guard: Arc<RateLimitGuard>,
    ) -> Result<Self> {
        let retry = config.retry.to_retry_config();
        let ttls = &config.cache;
        let org = config.github.org.clone();

        let plugins = Hydrator::builder(
            plugins::NAMESPACE,
            Upstream::GITHUB,
            PluginsFetcher::new(github.clone(), config.github.plugin_suffix.as_str()),
        )
        .ttl(Duration::from_secs(ttls.plugins_ttl_secs))
        .retry(retry.clone())
        .build(Arc::clone(&cache), Arc::clone(&guard))?;

        let releases = Hydrator::builder(
            releases::NAMESPACE,
            Upstream::GITHUB,
            ReleasesFetcher::new(github.clone(), org.as_str()),
        )
        .ttl(Duration::from_secs(ttls.releases_ttl_secs))
        .retry(retry.clone())
        .build(Arc::clone(&cache), Arc::clone(&guard))?;

        let repo_meta = Hydrator::builder(repo_meta::NAMESPACE, Upstream::GITHUB, RepoMetaFetcher::new(github))
            .ttl(Duration::from_secs(ttls.repo_meta_ttl_secs))
            .retry(retry.clone())
            .build(Arc::clone(&cache), Arc::clone(&guard))?;

        let stats = Hydrator::builder(stats::NAMESPACE, Upstream::SITE, StatsFetcher::new(site.clone()))
            .ttl(Duration::from_secs(ttls.stats_ttl_secs))
            .retry(retry.clone())
            .build(Arc::clone(&cache), Arc::clone(&guard))?;

        let donors = Hydrator::builder(donors::NAMESPACE, Upstream::SITE, DonorsFetcher::new(site))
            .ttl(Duration::from_secs(ttls.donors_ttl_secs))
            .retry(retry)
            .build(cache, guard)?;

        Ok(Self {
            plugins: Arc::new(plugins),
            releases: Arc::new(releases),
            repo_meta: Arc::new(repo_meta),
            stats: Arc::new(stats),
            donors: Arc::new(donors),
            org,
            web_apps: config.github.web_apps.clone(),
        })
    }

    /// The configured organization, the default item key for the plugins widget.
    pub fn org(&self) -> &str {
        &self.org
    }

    /// Configured `owner/repo` paths of the showcased web apps.
    pub fn web_apps(&self) -> &[String] {
        &self.web_apps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::HydrantError;
    use crate::storage::MemoryStorage;

    fn shared() -> (Arc<PersistentCache>, Arc<RateLimitGuard>) {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(0));
        (
            Arc::new(PersistentCache::new(storage.clone(), clock.clone())),
            Arc::new(RateLimitGuard::new(storage, clock)),
        )
    }

    #[test]
    fn test_namespace_storage_keys() {
        let keys: Vec<String> = NAMESPACES.iter().map(|ns| ns.storage_key()).collect();
        assert_eq!(
            keys,
            vec![
                "endstonePluginsCache:v3",
                "endstoneReleaseDownloadsCache:v2",
                "webAppsGithubRepoMetaCache:v2",
                "siteStatsCache:v1",
                "donatorsCache:v1",
            ]
        );
    }

    #[test]
    fn test_widgets_use_configured_ttls() {
        let mut config = Config::default();
        config.cache.stats_ttl_secs = 42;
        config.github.web_apps = vec!["Org/app".to_string()];
        let (cache, guard) = shared();

        let widgets = Widgets::new(&config, cache, guard).unwrap();
        assert_eq!(widgets.stats.ttl(), Duration::from_secs(42));
        assert_eq!(widgets.plugins.ttl(), Duration::from_secs(21600));
        assert_eq!(widgets.web_apps(), ["Org/app".to_string()]);
        assert_eq!(widgets.org(), config.github.org);
    }

    #[test]
    fn test_second_wiring_on_same_cache_is_accepted() {
        let config = Config::default();
        let (cache, guard) = shared();
        Widgets::new(&config, Arc::clone(&cache), Arc::clone(&guard)).unwrap();
        Widgets::new(&config, cache, guard).unwrap();
    }

    #[test]
    fn test_conflicting_namespace_rejected() {
        let config = Config::default();
        let (cache, guard) = shared();
        cache.register::<String>(&stats::NAMESPACE).unwrap();
        let err = Widgets::new(&config, cache, guard).err().unwrap();
        assert!(matches!(err, HydrantError::NamespaceConflict { .. }));
    }
}
