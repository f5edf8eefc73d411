// Filesystem locations.
// Resolves the per-user cache and config directories and maps storage keys to file names.

use std::path::PathBuf;

use directories::ProjectDirs;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "hydrant")
}

/// Get the base cache directory (~/.cache/hydrant on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Path to the default config file (~/.config/hydrant/config.toml on Linux).
pub fn config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

/// File name holding the value of a storage key.
pub fn file_name(key: &str) -> String {
    format!("{}.json", sanitize_name(key))
}

/// Sanitize a storage key for use as a file name.
/// Keeps `[A-Za-z0-9._-]` and replaces everything else with underscores.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '_' | '-' => c,
            _ => '_',
        })
        .collect()
}
