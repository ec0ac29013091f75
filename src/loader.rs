use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::article::ArticleSummary;
use crate::fetcher::Fetcher;
use crate::parser::{extract_articles, EntryPolicy};
use crate::query::{build_query_url, redact_api_key, ApiConfig, QueryOptions};

/// Result of one load cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The request and parse succeeded; the list may be empty.
    Loaded(Vec<ArticleSummary>),
    /// Nothing usable came back. The cause has already been logged.
    Failed,
}

impl LoadOutcome {
    pub fn articles(&self) -> Option<&[ArticleSummary]> {
        match self {
            LoadOutcome::Loaded(articles) => Some(articles),
            LoadOutcome::Failed => None,
        }
    }
}

impl From<Option<Vec<ArticleSummary>>> for LoadOutcome {
    fn from(articles: Option<Vec<ArticleSummary>>) -> Self {
        articles.map_or(LoadOutcome::Failed, LoadOutcome::Loaded)
    }
}

/// Runs the query, fetch and parse steps for one set of options.
#[derive(Clone)]
pub struct NewsLoader {
    fetcher: Arc<Fetcher>,
    api: Arc<ApiConfig>,
    policy: EntryPolicy,
}

impl NewsLoader {
    pub fn new(fetcher: Arc<Fetcher>, api: Arc<ApiConfig>, policy: EntryPolicy) -> Self {
        Self {
            fetcher,
            api,
            policy,
        }
    }

    /// Run one load cycle on the current task.
    pub async fn load(&self, options: &QueryOptions) -> LoadOutcome {
        info!(
            "Loading news (section={}, order-by={})",
            options.section, options.order_by
        );

        let url = match build_query_url(&self.api, options) {
            Ok(url) => url,
            Err(e) => {
                error!("Failed to build query: {}", e);
                return LoadOutcome::Failed;
            }
        };
        debug!("Query URL: {}", redact_api_key(&url));

        let Some(body) = self.fetcher.fetch_body(url.as_str()).await else {
            return LoadOutcome::Failed;
        };

        let outcome = LoadOutcome::from(extract_articles(Some(&body), self.policy));
        if let LoadOutcome::Loaded(articles) = &outcome {
            info!("Loaded {} articles", articles.len());
        }
        outcome
    }

    /// Run one load cycle on a background task and deliver the outcome to
    /// `reply`. If the receiver has gone away the outcome is dropped.
    pub fn spawn(
        &self,
        options: QueryOptions,
        reply: oneshot::Sender<LoadOutcome>,
    ) -> JoinHandle<()> {
        let loader = self.clone();
        tokio::spawn(async move {
            let outcome = loader.load(&options).await;
            if reply.send(outcome).is_err() {
                debug!("Load finished after its receiver was dropped, discarding");
            }
        })
    }

    /// Spawn a load cycle and wait for its outcome.
    pub async fn load_in_background(&self, options: QueryOptions) -> LoadOutcome {
        let (tx, rx) = oneshot::channel();
        self.spawn(options, tx);
        rx.await.unwrap_or(LoadOutcome::Failed)
    }
}
