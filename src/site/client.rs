// Site API HTTP client.
// First-party JSON endpoints: the statistics document and the donor list.

use std::time::Duration;

use reqwest::{
    Client,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
};
use serde_json::Value;
use tracing::debug;

use crate::error::{FetchError, HydrantError, Result};
use crate::github::client::check_response;

use super::types::{Donor, StatsDocument};

pub const SITE_API_BASE: &str = "https://api.euphoriadevelopment.uk";

/// Client for the site's own API.
#[derive(Debug, Clone)]
pub struct SiteClient {
    client: Client,
    base_url: String,
}

impl SiteClient {
    pub fn new(base_url: impl Into<String>, user_agent: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent).map_err(|e| HydrantError::Config(e.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> std::result::Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%url, "GET");
        let response = check_response(self.client.get(&url).send().await?)?;
        Ok(response.json().await?)
    }

    /// Get the statistics document.
    pub async fn get_stats(&self) -> std::result::Result<StatsDocument, FetchError> {
        self.get_json("/stats/").await
    }

    /// Get the donor list with unsafe links removed.
    ///
    /// A body that is not a list yields no donors; entries that are not
    /// objects are skipped.
    pub async fn get_donors(&self) -> std::result::Result<Vec<Donor>, FetchError> {
        let body: Value = self.get_json("/donators").await?;
        let Value::Array(items) = body else {
            return Ok(Vec::new());
        };
        Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<Donor>(item).ok())
            .map(Donor::sanitized)
            .collect())
    }
}
