use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::parser::EntryPolicy;
use crate::query::{ApiConfig, QueryOptions};

/// Environment variable that overrides `api.api_key`.
pub const API_KEY_ENV: &str = "GUARDIAN_API_KEY";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    pub api: ApiSection,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub defaults: QueryOptions,
    #[serde(default = "default_topics")]
    pub topics: Vec<TopicConfig>,
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSection {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    pub api_key: String,
    #[serde(default = "default_show_fields")]
    pub show_fields: String,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub entry_policy: EntryPolicy,
}

fn default_endpoint() -> String {
    "https://content.guardianapis.com/search".to_string()
}

fn default_show_fields() -> String {
    "headline,trailText,byline,thumbnail".to_string()
}

fn default_format() -> String {
    "json".to_string()
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct FetchConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    15
}

fn default_read_timeout() -> u64 {
    10
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
        }
    }
}

impl FetchConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

/// A section offered in the topic picker.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TopicConfig {
    pub id: String,
    pub label: String,
}

fn default_topics() -> Vec<TopicConfig> {
    [
        ("all", "All sections"),
        ("world", "World"),
        ("technology", "Technology"),
        ("science", "Science"),
        ("business", "Business"),
        ("sport", "Sport"),
        ("culture", "Culture"),
    ]
    .into_iter()
    .map(|(id, label)| TopicConfig {
        id: id.to_string(),
        label: label.to_string(),
    })
    .collect()
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_str(&content)?;
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                config.api.api_key = key;
            }
        }
        Ok(config)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let endpoint = url::Url::parse(&self.api.endpoint)
            .map_err(|e| anyhow::anyhow!("invalid api.endpoint '{}': {}", self.api.endpoint, e))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            anyhow::bail!("api.endpoint must be an http(s) URL, got '{}'", self.api.endpoint);
        }
        if self.fetch.connect_timeout_secs == 0 || self.fetch.read_timeout_secs == 0 {
            anyhow::bail!("fetch timeouts must be positive");
        }
        Ok(())
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            endpoint: self.api.endpoint.clone(),
            api_key: self.api.api_key.clone(),
            show_fields: self.api.show_fields.clone(),
            format: self.api.format.clone(),
        }
    }
}
