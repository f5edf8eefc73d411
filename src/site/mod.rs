// Site API module.
// Client and types for the statistics and donor endpoints.

pub mod client;
pub mod types;

pub use client::SiteClient;
pub use types::{Donor, StatsDocument};
