// Hydration outcome.
// Every branch of stale-while-revalidate ends in exactly one of these.

use crate::error::FetchError;

/// Where a fresh payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Network,
}

/// Result of one hydration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Fresh data was rendered.
    Fresh { origin: Origin },
    /// Revalidation failed; the stale cached payload stays on screen.
    Stale { error: FetchError },
    /// The upstream is rate limited and nothing new was fetched.
    RateLimited {
        reset_at: Option<u64>,
        stale_shown: bool,
    },
    /// Nothing cached and the fetch failed.
    Failed(FetchError),
}

impl Outcome {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Outcome::Fresh { .. })
    }

    /// Whether the view ended up showing some payload.
    pub fn has_data(&self) -> bool {
        match self {
            Outcome::Fresh { .. } | Outcome::Stale { .. } => true,
            Outcome::RateLimited { stale_shown, .. } => *stale_shown,
            Outcome::Failed(_) => false,
        }
    }

    /// Short label for logs and the CLI.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Fresh {
                origin: Origin::Cache,
            } => "fresh (cache)",
            Outcome::Fresh {
                origin: Origin::Network,
            } => "fresh (network)",
            Outcome::Stale { .. } => "stale",
            Outcome::RateLimited { .. } => "rate limited",
            Outcome::Failed(_) => "error",
        }
    }
}
