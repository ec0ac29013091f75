use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Section value meaning "do not narrow by section".
pub const ALL_SECTIONS: &str = "all";

/// Default sort order, newest articles first.
pub const DEFAULT_ORDER: &str = "newest";

/// Static parameters of the search API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub show_fields: String,
    pub format: String,
}

/// User-selected options for one load.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct QueryOptions {
    pub section: String,
    #[serde(alias = "order-by")]
    pub order_by: String,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            section: ALL_SECTIONS.to_string(),
            order_by: DEFAULT_ORDER.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
}

/// Assemble the search URL. The section is passed through untouched; an
/// unknown section is for the API to reject.
pub fn build_query_url(api: &ApiConfig, options: &QueryOptions) -> Result<Url, QueryError> {
    let mut url = Url::parse(&api.endpoint).map_err(|source| QueryError::InvalidEndpoint {
        endpoint: api.endpoint.clone(),
        source,
    })?;

    url.query_pairs_mut()
        .append_pair("format", &api.format)
        .append_pair("section", &options.section)
        .append_pair("show-fields", &api.show_fields)
        .append_pair("order-by", &options.order_by)
        .append_pair("api-key", &api.api_key);

    Ok(url)
}

/// The URL with the `api-key` value masked, for logging.
pub fn redact_api_key(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "api-key" { "***".into() } else { v };
            (k.into_owned(), v.into_owned())
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}
