//! Configuration loading.
//!
//! Configuration is read from TOML with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.config/hydrant/config.toml` (user)
//! 3. built-in defaults
//!
//! The only secret, `GITHUB_TOKEN`, comes from the environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{HydrantError, Result};
use crate::github::client::GITHUB_API_BASE;
use crate::retry::RetryConfig;
use crate::site::client::SITE_API_BASE;
use crate::storage::paths;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub http: HttpConfig,
}

/// GitHub-backed widgets.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitHubConfig {
    pub api_base: String,
    /// Organization whose repositories are listed as plugins.
    pub org: String,
    /// Repository name suffix marking a plugin (case-insensitive).
    pub plugin_suffix: String,
    /// `owner/repo` paths of the web apps showcased on the page.
    pub web_apps: Vec<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: GITHUB_API_BASE.to_string(),
            org: "EuphoriaDevelopmentOrg".to_string(),
            plugin_suffix: "-endstone".to_string(),
            web_apps: Vec::new(),
        }
    }
}

/// First-party API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub api_base: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            api_base: SITE_API_BASE.to_string(),
        }
    }
}

/// Cache location and per-widget TTLs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Storage directory (default: the user cache directory).
    pub dir: Option<PathBuf>,
    pub plugins_ttl_secs: u64,
    pub releases_ttl_secs: u64,
    pub repo_meta_ttl_secs: u64,
    pub stats_ttl_secs: u64,
    pub donors_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            plugins_ttl_secs: 6 * 60 * 60,
            releases_ttl_secs: 6 * 60 * 60,
            repo_meta_ttl_secs: 6 * 60 * 60,
            stats_ttl_secs: 5 * 60,
            donors_ttl_secs: 10 * 60,
        }
    }
}

impl CacheConfig {
    /// The configured directory, else the user cache directory.
    pub fn resolved_dir(&self) -> Option<PathBuf> {
        self.dir.clone().or_else(paths::cache_dir)
    }
}

/// Backoff for transient failures.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let defaults = RetryConfig::default();
        Self {
            max_attempts: defaults.max_attempts,
            initial_delay_ms: defaults.initial_delay.as_millis() as u64,
            max_delay_ms: defaults.max_delay.as_millis() as u64,
        }
    }
}

impl RetrySettings {
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig::new()
            .max_attempts(self.max_attempts)
            .initial_delay(Duration::from_millis(self.initial_delay_ms))
            .max_delay(Duration::from_millis(self.max_delay_ms))
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: concat!("hydrant/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load from `explicit` if given, else the user config file if it
    /// exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match paths::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            HydrantError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.github.org.trim().is_empty() {
            return Err(HydrantError::Config("github.org must not be empty".into()));
        }
        if let Some(bad) = self
            .github
            .web_apps
            .iter()
            .find(|path| path.split('/').filter(|s| !s.is_empty()).count() != 2)
        {
            return Err(HydrantError::Config(format!(
                "github.web_apps entry {bad:?} is not an owner/repo path"
            )));
        }
        Ok(())
    }
}

/// GitHub token from the environment, if set and non-empty.
pub fn github_token() -> Option<String> {
    std::env::var("GITHUB_TOKEN")
        .ok()
        .filter(|token| !token.trim().is_empty())
}
