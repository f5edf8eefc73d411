//! hydrant: hydrate the site's widgets from the command line
//!
//! Paints each widget from the persistent cache, revalidates stale entries
//! against GitHub and the site API, and prints what a page would render.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use hydrant::github::ReleaseDownload;
use hydrant::guard::GUARD_STORAGE_KEY;
use hydrant::site::{Donor, StatsDocument};
use hydrant::widgets::{
    NAMESPACES, Plugin, RepoMeta, counting_plugins, counting_stats, publish_web_apps,
};
use hydrant::{
    AggregationBus, Config, Failure, FetchError, FileStorage, MemoryStorage, Outcome,
    PersistentCache, RateLimitGuard, Storage, SystemClock, View, Widgets,
};

/// Cache-aside hydration of site widgets
#[derive(Parser)]
#[command(name = "hydrant")]
#[command(version = hydrant::PKG_VERSION)]
#[command(about = "Hydrate site widgets from GitHub and the site API")]
struct Args {
    /// Config file (default: <config dir>/hydrant/config.toml)
    #[arg(short, long, env = "HYDRANT_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the organization's plugins
    Plugins,

    /// Show the download for plugin repositories
    Releases {
        /// Repository names within the organization
        #[arg(required = true)]
        repos: Vec<String>,
    },

    /// Show repository metadata (default: the configured web apps)
    Meta {
        /// owner/repo paths
        repos: Vec<String>,
    },

    /// Show site statistics
    Stats,

    /// List donors
    Donors,

    /// Hydrate every widget and print the project total
    All,

    /// Delete every cached entry and the rate-limit state
    Clear,
}

/// Prints each rendered payload as lines prefixed with the widget label.
struct Printer<T> {
    label: String,
    lines: fn(&T) -> Vec<String>,
}

impl<T> Printer<T> {
    fn new(label: impl Into<String>, lines: fn(&T) -> Vec<String>) -> Self {
        Self {
            label: label.into(),
            lines,
        }
    }
}

impl<T> View<T> for Printer<T> {
    fn render(&self, payload: &T) {
        for line in (self.lines)(payload) {
            println!("{}: {}", self.label, line);
        }
    }

    fn on_error(&self, failure: &Failure) {
        let message = match failure {
            Failure::RateLimited { reset_at } => FetchError::RateLimited {
                reset_at: *reset_at,
            }
            .to_string(),
            Failure::Unavailable(error) => format!("unavailable ({error})"),
        };
        println!("{}: {}", self.label, message);
    }
}

fn plugin_lines(plugins: &Vec<Plugin>) -> Vec<String> {
    if plugins.is_empty() {
        return vec!["no plugins".to_string()];
    }
    plugins
        .iter()
        .map(|p| {
            format!(
                "{} ★{} ⑂{} {} {}",
                p.display_name,
                p.stars,
                p.forks,
                p.language.as_deref().unwrap_or("-"),
                p.html_url
            )
        })
        .collect()
}

fn release_lines(download: &ReleaseDownload) -> Vec<String> {
    vec![match download {
        ReleaseDownload::Asset { url, asset_name } => format!("{asset_name} {url}"),
        ReleaseDownload::NoAsset => "release has no downloadable asset".to_string(),
        ReleaseDownload::NoRelease => "no release".to_string(),
    }]
}

fn meta_lines(meta: &RepoMeta) -> Vec<String> {
    let updated = meta
        .updated_at
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());
    vec![format!(
        "{} ★{} ⑂{} updated {}",
        meta.language, meta.stars, meta.forks, updated
    )]
}

fn stats_lines(stats: &StatsDocument) -> Vec<String> {
    vec![
        format!("api calls {}", stats.total_api_calls),
        format!("installs {}", stats.total_installs),
        format!("blueprint extensions {}", stats.blueprint_count()),
    ]
}

fn donor_lines(donors: &Vec<Donor>) -> Vec<String> {
    if donors.is_empty() {
        return vec!["no donors yet".to_string()];
    }
    donors
        .iter()
        .map(|d| match (&d.donation, &d.link) {
            (Some(donation), Some(link)) => format!("{} ({donation}) {link}", d.name),
            (Some(donation), None) => format!("{} ({donation})", d.name),
            (None, Some(link)) => format!("{} {link}", d.name),
            (None, None) => d.name.clone(),
        })
        .collect()
}

fn report(label: &str, outcome: &Outcome) {
    debug!(widget = label, outcome = outcome.label(), "hydrated");
    if !outcome.has_data() {
        eprintln!("{label}: {}", outcome.label());
    }
}

fn open_storage(config: &Config) -> Arc<dyn Storage> {
    match config.cache.resolved_dir() {
        Some(dir) => Arc::new(FileStorage::new(dir)),
        None => {
            warn!("no cache directory available, caching in memory only");
            Arc::new(MemoryStorage::new())
        }
    }
}

fn clear(cache: &PersistentCache, storage: &dyn Storage) {
    for namespace in &NAMESPACES {
        cache.clear(namespace);
        println!("cleared {}", namespace.storage_key());
    }
    match storage.remove(GUARD_STORAGE_KEY) {
        Ok(()) => println!("cleared {GUARD_STORAGE_KEY}"),
        Err(e) => warn!(error = %e, "failed to clear rate-limit state"),
    }
}

async fn hydrate_meta(widgets: &Widgets, repos: Vec<String>) {
    let handles: Vec<_> = repos
        .into_iter()
        .map(|repo| {
            let view = Arc::new(Printer::new(repo.clone(), meta_lines));
            (repo.clone(), widgets.repo_meta.spawn(repo, view))
        })
        .collect();
    for (repo, handle) in handles {
        match handle.await {
            Ok(outcome) => report(&repo, &outcome),
            Err(e) => warn!(repo, error = %e, "metadata task failed"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Default: info for this crate; override with RUST_LOG.
    let default_filter = if args.verbose { "hydrant=debug" } else { "hydrant=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(args.config.as_deref())?;
    let storage = open_storage(&config);
    let clock = Arc::new(SystemClock);
    let cache = Arc::new(PersistentCache::new(Arc::clone(&storage), clock.clone()));
    let guard = Arc::new(RateLimitGuard::new(Arc::clone(&storage), clock));
    let bus = Arc::new(AggregationBus::default());

    let widgets = Widgets::new(&config, Arc::clone(&cache), guard)?;

    match args.command {
        Command::Plugins => {
            let view = counting_plugins(Printer::new("plugins", plugin_lines), Arc::clone(&bus));
            let outcome = widgets.plugins.hydrate(widgets.org(), &view).await;
            report("plugins", &outcome);
        }
        Command::Releases { repos } => {
            let handles: Vec<_> = repos
                .into_iter()
                .map(|repo| {
                    let view = Arc::new(Printer::new(repo.clone(), release_lines));
                    (repo.clone(), widgets.releases.spawn(repo, view))
                })
                .collect();
            for (repo, handle) in handles {
                match handle.await {
                    Ok(outcome) => report(&repo, &outcome),
                    Err(e) => warn!(repo, error = %e, "release task failed"),
                }
            }
        }
        Command::Meta { repos } => {
            let repos = if repos.is_empty() {
                widgets.web_apps().to_vec()
            } else {
                repos
            };
            hydrate_meta(&widgets, repos).await;
        }
        Command::Stats => {
            let view = counting_stats(Printer::new("stats", stats_lines), Arc::clone(&bus));
            let outcome = widgets.stats.hydrate("stats", &view).await;
            report("stats", &outcome);
        }
        Command::Donors => {
            let view = Printer::new("donors", donor_lines);
            let outcome = widgets.donors.hydrate("donors", &view).await;
            report("donors", &outcome);
        }
        Command::All => {
            let updates = bus.subscribe_with(|update| {
                debug!(
                    source = %update.source,
                    value = update.value,
                    total = update.total,
                    "project total updated"
                );
            });

            publish_web_apps(&bus, widgets.web_apps());
            let plugins_view = counting_plugins(Printer::new("plugins", plugin_lines), Arc::clone(&bus));
            let stats_view = counting_stats(Printer::new("stats", stats_lines), Arc::clone(&bus));
            let donors_view = Printer::new("donors", donor_lines);

            let (plugins, stats, donors, ()) = tokio::join!(
                widgets.plugins.hydrate(widgets.org(), &plugins_view),
                widgets.stats.hydrate("stats", &stats_view),
                widgets.donors.hydrate("donors", &donors_view),
                hydrate_meta(&widgets, widgets.web_apps().to_vec()),
            );
            report("plugins", &plugins);
            report("stats", &stats);
            report("donors", &donors);

            println!("total projects: {}", bus.total());
            updates.abort();
        }
        Command::Clear => clear(&cache, storage.as_ref()),
    }

    Ok(())
}
