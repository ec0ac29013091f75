use reqwest::{Client, StatusCode, Url};
use thiserror::Error;
use tracing::{error, info};

use crate::config::FetchConfig;

const USER_AGENT: &str = "GuardianReader/1.0 (News Reader)";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL '{0}'")]
    InvalidUrl(String),
    #[error("unexpected response status {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),
}

/// Performs the single GET behind each load.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.read_timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client })
    }

    /// GET `url` and return the body as text. Only a 200 counts as success.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let url = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        info!("Fetched {} bytes", bytes.len());
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Like [`Fetcher::fetch`], but logs the failure and returns `None`.
    pub async fn fetch_body(&self, url: &str) -> Option<String> {
        match self.fetch(url).await {
            Ok(body) => Some(body),
            Err(e) => {
                error!("Failed to fetch news: {}", e);
                None
            }
        }
    }
}
