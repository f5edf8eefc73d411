// Site API response types.
// Counts are parsed leniently: missing, negative, or non-numeric values become 0.

use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The statistics document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsDocument {
    /// Blueprint addons and themes, in one list.
    #[serde(default, deserialize_with = "lenient_list")]
    pub blueprint_extensions: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_api_calls: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_installs: u64,
}

impl StatsDocument {
    pub fn blueprint_count(&self) -> u64 {
        self.blueprint_extensions.len() as u64
    }
}

/// A donor entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donor {
    #[serde(rename = "Name", default = "unknown_name", deserialize_with = "lenient_name")]
    pub name: String,
    #[serde(rename = "Donation", default, deserialize_with = "lenient_text")]
    pub donation: Option<String>,
    #[serde(rename = "Link", default, deserialize_with = "lenient_text")]
    pub link: Option<String>,
    #[serde(rename = "Image", default, deserialize_with = "lenient_text")]
    pub image: Option<String>,
}

impl Donor {
    /// Drop links and images that are not absolute http(s) URLs.
    pub fn sanitized(mut self) -> Self {
        self.link = self.link.as_deref().and_then(safe_url);
        self.image = self.image.as_deref().and_then(safe_url);
        self.donation = self.donation.filter(|d| !d.trim().is_empty());
        self
    }
}

/// Normalize `raw` to an http(s) URL, or `None`.
pub fn safe_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    match url.scheme() {
        "http" | "https" => Some(url.to_string()),
        _ => None,
    }
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let n = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(n.filter(|n| n.is_finite() && *n > 0.0)
        .map(|n| n.floor() as u64)
        .unwrap_or(0))
}

fn lenient_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Value>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items),
        _ => Ok(Vec::new()),
    }
}

fn unknown_name() -> String {
    "Unknown".to_string()
}

fn lenient_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Ok(unknown_name()),
    }
}

/// Strings are kept and numbers are written out; anything else is absent.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        _ => Ok(None),
    }
}
