// GitHub API module.
// Provides the client, response types, and release resolution used by the GitHub-backed widgets.

pub mod client;
pub mod endpoints;
pub mod releases;
pub mod types;

pub use client::GitHubClient;
pub use releases::{ReleaseDownload, pick_best_asset};
pub use types::*;
