use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::article::ArticleSummary;
use crate::config::TopicConfig;
use crate::loader::{LoadOutcome, NewsLoader};
use crate::query::QueryOptions;

const APP_TITLE: &str = "Guardian Reader";

/// htmx response header that sets the address pushed into history.
const HX_PUSH_URL: &str = "hx-push-url";

/// Sort orders offered in the settings form.
const ORDERS: &[(&str, &str)] = &[
    ("newest", "Newest first"),
    ("oldest", "Oldest first"),
    ("relevance", "Relevance"),
];

pub struct AppState {
    pub loader: NewsLoader,
    pub topics: Vec<TopicConfig>,
    pub defaults: QueryOptions,
}

// Template structs
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub title: &'static str,
    pub topics: Vec<TopicConfig>,
    pub orders: Vec<OrderChoice>,
    pub options: QueryOptions,
    pub articles: Vec<ArticleSummary>,
    pub failed: bool,
}

#[derive(Template)]
#[template(path = "articles.html")]
pub struct ArticlesTemplate {
    pub articles: Vec<ArticleSummary>,
    pub failed: bool,
}

pub struct OrderChoice {
    pub id: &'static str,
    pub label: &'static str,
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

/// Settings picked in the form. Empty values fall back to the configured
/// defaults; anything else is used as given.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsQuery {
    pub section: Option<String>,
    #[serde(rename = "order-by")]
    pub order_by: Option<String>,
}

impl SettingsQuery {
    pub fn resolve(self, defaults: &QueryOptions) -> QueryOptions {
        QueryOptions {
            section: non_empty(self.section).unwrap_or_else(|| defaults.section.clone()),
            order_by: non_empty(self.order_by).unwrap_or_else(|| defaults.order_by.clone()),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Full-page URL for `options`, so a fragment swap leaves a reloadable
/// address in the browser history.
pub fn page_url(options: &QueryOptions) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("section", &options.section)
        .append_pair("order-by", &options.order_by)
        .finish();
    format!("/?{}", query)
}

fn split_outcome(outcome: LoadOutcome) -> (Vec<ArticleSummary>, bool) {
    match outcome {
        LoadOutcome::Loaded(articles) => (articles, false),
        LoadOutcome::Failed => (Vec::new(), true),
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/articles", get(articles))
        .route("/health", get(health))
        .with_state(state)
}

// Route handlers
pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SettingsQuery>,
) -> impl IntoResponse {
    let options = query.resolve(&state.defaults);
    let outcome = state.loader.load_in_background(options.clone()).await;
    let (articles, failed) = split_outcome(outcome);

    HtmlTemplate(IndexTemplate {
        title: APP_TITLE,
        topics: state.topics.clone(),
        orders: ORDERS
            .iter()
            .map(|&(id, label)| OrderChoice { id, label })
            .collect(),
        options,
        articles,
        failed,
    })
}

pub async fn articles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SettingsQuery>,
) -> impl IntoResponse {
    let options = query.resolve(&state.defaults);
    let push_url = page_url(&options);
    let outcome = state.loader.load_in_background(options).await;
    let (articles, failed) = split_outcome(outcome);

    (
        [(HX_PUSH_URL, push_url)],
        HtmlTemplate(ArticlesTemplate { articles, failed }),
    )
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;
    use crate::fetcher::Fetcher;
    use crate::parser::EntryPolicy;
    use crate::query::ApiConfig;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RESULTS: &str = r#"{
        "response": {
            "results": [
                {"sectionName": "Technology", "webUrl": "https://example.com/chips",
                 "webPublicationDate": "2021-03-05T10:00:00Z",
                 "fields": {"headline": "Chips are down", "trailText": "<b>Big</b> news",
                            "byline": "Alex Hern", "thumbnail": "https://img.example.com/chips.jpg"}},
                {"sectionName": "Technology", "webUrl": "https://example.com/robots",
                 "webPublicationDate": "garbage",
                 "fields": {"headline": "Robots &amp; you"}}
            ]
        }
    }"#;

    fn create_test_app(server: &MockServer) -> Router {
        let api = ApiConfig {
            endpoint: format!("{}/search", server.uri()),
            api_key: "test".to_string(),
            show_fields: "headline,trailText,byline,thumbnail".to_string(),
            format: "json".to_string(),
        };
        let fetcher = Fetcher::new(&FetchConfig::default()).unwrap();
        let loader = NewsLoader::new(Arc::new(fetcher), Arc::new(api), EntryPolicy::Abort);

        let state = Arc::new(AppState {
            loader,
            topics: vec![
                TopicConfig {
                    id: "all".to_string(),
                    label: "All sections".to_string(),
                },
                TopicConfig {
                    id: "technology".to_string(),
                    label: "Technology".to_string(),
                },
            ],
            defaults: QueryOptions::default(),
        });

        router(state)
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn mount_results(server: &MockServer) {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS))
            .mount(server)
            .await;
    }

    mod health_tests {
        use super::*;

        #[tokio::test]
        async fn test_health_endpoint() {
            let server = MockServer::start().await;
            let (status, body) = get_body(create_test_app(&server), "/health").await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, "OK");
        }
    }

    mod index_tests {
        use super::*;

        #[tokio::test]
        async fn test_index_renders_articles_in_order() {
            let server = MockServer::start().await;
            mount_results(&server).await;

            let (status, body) = get_body(create_test_app(&server), "/").await;

            assert_eq!(status, StatusCode::OK);
            assert!(body.contains(APP_TITLE));
            let first = body.find("Chips are down").unwrap();
            let second = body.find("Robots").unwrap();
            assert!(first < second);
        }

        #[tokio::test]
        async fn test_index_renders_article_fields() {
            let server = MockServer::start().await;
            mount_results(&server).await;

            let (_, body) = get_body(create_test_app(&server), "/").await;

            assert!(body.contains("Big news"));
            assert!(!body.contains("<b>Big</b>"));
            assert!(body.contains("Alex Hern"));
            assert!(body.contains("Mar 5, 2021 10:00"));
            assert!(body.contains("https://img.example.com/chips.jpg"));
            assert!(body.contains(r#"href="https://example.com/chips""#));
            assert!(body.contains("target=\"_blank\""));
        }

        #[tokio::test]
        async fn test_index_uses_placeholder_without_thumbnail() {
            let server = MockServer::start().await;
            mount_results(&server).await;

            let (_, body) = get_body(create_test_app(&server), "/").await;
            assert!(body.contains("/static/placeholder.svg"));
        }

        #[tokio::test]
        async fn test_index_passes_settings_to_query() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(query_param("section", "technology"))
                .and(query_param("order-by", "oldest"))
                .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS))
                .expect(1)
                .mount(&server)
                .await;

            let (status, body) = get_body(
                create_test_app(&server),
                "/?section=technology&order-by=oldest",
            )
            .await;

            assert_eq!(status, StatusCode::OK);
            assert!(body.contains("Chips are down"));
        }

        #[tokio::test]
        async fn test_index_empty_result_set() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_string(r#"{"response":{"results":[]}}"#),
                )
                .mount(&server)
                .await;

            let (status, body) = get_body(create_test_app(&server), "/").await;

            assert_eq!(status, StatusCode::OK);
            assert!(body.contains("No news found."));
        }

        #[tokio::test]
        async fn test_index_fetch_failure() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(503))
                .mount(&server)
                .await;

            let (status, body) = get_body(create_test_app(&server), "/").await;

            assert_eq!(status, StatusCode::OK);
            assert!(body.contains("Unable to load news."));
            assert!(!body.contains("No news found."));
        }
    }

    mod articles_tests {
        use super::*;

        #[tokio::test]
        async fn test_articles_fragment() {
            let server = MockServer::start().await;
            mount_results(&server).await;

            let (status, body) =
                get_body(create_test_app(&server), "/articles?section=technology").await;

            assert_eq!(status, StatusCode::OK);
            assert!(body.contains("Chips are down"));
            assert!(!body.contains("<html"));
        }

        #[tokio::test]
        async fn test_articles_pushes_full_page_url() {
            let server = MockServer::start().await;
            mount_results(&server).await;

            let response = create_test_app(&server)
                .oneshot(
                    Request::builder()
                        .uri("/articles?section=sport&order-by=oldest")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let pushed = response
                .headers()
                .get(HX_PUSH_URL)
                .and_then(|v| v.to_str().ok())
                .unwrap();
            assert_eq!(pushed, "/?section=sport&order-by=oldest");
        }

        #[tokio::test]
        async fn test_pushed_url_serves_full_page() {
            let server = MockServer::start().await;
            mount_results(&server).await;

            let (_, body) = get_body(
                create_test_app(&server),
                &page_url(&QueryOptions {
                    section: "technology".to_string(),
                    order_by: "newest".to_string(),
                }),
            )
            .await;

            assert!(body.contains("<html"));
            assert!(body.contains(r#"<option value="technology" selected>"#));
            assert!(body.contains("Chips are down"));
        }

        #[tokio::test]
        async fn test_articles_pushes_defaults_when_empty() {
            let server = MockServer::start().await;
            mount_results(&server).await;

            let response = create_test_app(&server)
                .oneshot(Request::builder().uri("/articles").body(Body::empty()).unwrap())
                .await
                .unwrap();

            let pushed = response.headers().get(HX_PUSH_URL).unwrap();
            assert_eq!(pushed, "/?section=all&order-by=newest");
        }
    }

    mod settings_query_tests {
        use super::*;

        #[test]
        fn test_settings_query_defaults() {
            let query: SettingsQuery = serde_urlencoded::from_str("").unwrap();
            let options = query.resolve(&QueryOptions::default());
            assert_eq!(options, QueryOptions::default());
        }

        #[test]
        fn test_settings_query_values() {
            let query: SettingsQuery =
                serde_urlencoded::from_str("section=sport&order-by=relevance").unwrap();
            let options = query.resolve(&QueryOptions::default());
            assert_eq!(options.section, "sport");
            assert_eq!(options.order_by, "relevance");
        }

        #[test]
        fn test_empty_values_fall_back() {
            let query: SettingsQuery = serde_urlencoded::from_str("section=&order-by=").unwrap();
            let defaults = QueryOptions {
                section: "world".to_string(),
                order_by: "oldest".to_string(),
            };
            assert_eq!(query.resolve(&defaults), defaults);
        }

        #[test]
        fn test_values_passed_through_verbatim() {
            let query: SettingsQuery =
                serde_urlencoded::from_str("section=%20sport%20&order-by=%20").unwrap();
            let options = query.resolve(&QueryOptions::default());
            assert_eq!(options.section, " sport ");
            assert_eq!(options.order_by, " ");
        }

        #[test]
        fn test_page_url_encodes_options() {
            let options = QueryOptions {
                section: "arts & culture".to_string(),
                order_by: "newest".to_string(),
            };
            assert_eq!(page_url(&options), "/?section=arts+%26+culture&order-by=newest");
        }
    }
}
