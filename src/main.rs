use std::sync::Arc;

use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use guardian_reader::config::Config;
use guardian_reader::fetcher::Fetcher;
use guardian_reader::loader::NewsLoader;
use guardian_reader::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "guardian_reader=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::var("NEWS_CONFIG").unwrap_or_else(|_| "news.toml".to_string());
    let config = Config::load(&config_path)?;
    info!(
        "Loaded configuration from {} (endpoint {})",
        config_path, config.api.endpoint
    );

    let fetcher = Arc::new(Fetcher::new(&config.fetch)?);
    let loader = NewsLoader::new(
        fetcher,
        Arc::new(config.api_config()),
        config.api.entry_policy,
    );

    let state = Arc::new(AppState {
        loader,
        topics: config.topics.clone(),
        defaults: config.defaults.clone(),
    });

    // Build router
    let app = routes::router(state)
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http());

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Server starting on http://{}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
