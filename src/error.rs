// Error types for hydrant.
// Separates crate-level failures from the cloneable fetch-path errors shared by deduplicated callers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HydrantError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cache namespace {key} is already registered as {existing}")]
    NamespaceConflict { key: String, existing: &'static str },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HydrantError>;

/// Failure reading or writing durable storage.
///
/// Never surfaced past the cache or the rate-limit guard: reads turn into
/// misses and writes are dropped.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure on the fetch path.
///
/// `Clone` because one in-flight request hands the same outcome to every
/// caller that joined it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Upstream signalled quota exhaustion. `reset_at` is epoch millis when known.
    #[error("rate limit exceeded{}", reset_suffix(.reset_at))]
    RateLimited { reset_at: Option<u64> },

    #[error("request failed: {0}")]
    Network(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Whether retrying the same request may succeed.
    ///
    /// Rate limits are excluded: they are honored through the guard, not retried.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::RateLimited { .. } | FetchError::Malformed(_) => false,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. })
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Malformed(err.to_string())
    }
}

fn reset_suffix(reset_at: &Option<u64>) -> String {
    reset_at
        .and_then(|ms| chrono::DateTime::from_timestamp_millis(ms as i64))
        .map(|dt| format!(", resets at {}", dt.format("%H:%M:%S")))
        .unwrap_or_default()
}
