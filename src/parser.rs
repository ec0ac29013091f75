use scraper::{Html, Node};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, warn};

use crate::article::ArticleSummary;

/// What to do with a result entry that is not an object or has no `fields`
/// object.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryPolicy {
    /// Fail the whole batch.
    #[default]
    Abort,
    /// Drop the entry and keep the rest.
    Skip,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a JSON object at the root")]
    NotAnObject,
    #[error("missing or non-object key '{0}'")]
    MissingObject(&'static str),
    #[error("missing or non-array key '{0}'")]
    MissingArray(&'static str),
    #[error("malformed entry at index {index}: {reason}")]
    MalformedEntry { index: usize, reason: &'static str },
}

/// Map a search response to article summaries in source order.
pub fn parse_articles(text: &str, policy: EntryPolicy) -> Result<Vec<ArticleSummary>, ParseError> {
    let root: Value = serde_json::from_str(text)?;
    let root = root.as_object().ok_or(ParseError::NotAnObject)?;

    let response = root
        .get("response")
        .and_then(Value::as_object)
        .ok_or(ParseError::MissingObject("response"))?;
    let results = response
        .get("results")
        .and_then(Value::as_array)
        .ok_or(ParseError::MissingArray("results"))?;

    let mut articles = Vec::with_capacity(results.len());
    for (index, entry) in results.iter().enumerate() {
        match parse_entry(index, entry) {
            Ok(article) => articles.push(article),
            Err(e) if policy == EntryPolicy::Skip => {
                warn!("Skipping result: {}", e);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(articles)
}

/// Absorbing wrapper around [`parse_articles`]: empty or missing text and
/// parse failures all come back as `None`.
pub fn extract_articles(text: Option<&str>, policy: EntryPolicy) -> Option<Vec<ArticleSummary>> {
    let text = text.filter(|t| !t.is_empty())?;

    match parse_articles(text, policy) {
        Ok(articles) => Some(articles),
        Err(e) => {
            error!("Problem parsing the news JSON results: {}", e);
            None
        }
    }
}

fn parse_entry(index: usize, entry: &Value) -> Result<ArticleSummary, ParseError> {
    let entry = entry.as_object().ok_or(ParseError::MalformedEntry {
        index,
        reason: "entry is not an object",
    })?;
    let fields = entry
        .get("fields")
        .and_then(Value::as_object)
        .ok_or(ParseError::MalformedEntry {
            index,
            reason: "missing 'fields' object",
        })?;

    Ok(ArticleSummary::new(
        opt_string(entry, "sectionName"),
        opt_string(fields, "headline"),
        strip_html(&opt_string(fields, "trailText")),
        opt_string(fields, "byline"),
        opt_string(entry, "webPublicationDate"),
        opt_string(entry, "webUrl"),
        opt_string(fields, "thumbnail"),
    ))
}

/// String value of `key`, or empty when absent or null. Other scalars are
/// rendered as JSON text.
fn opt_string(object: &Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Reduce an HTML fragment to its text: tags dropped, entities decoded and
/// whitespace runs collapsed to single spaces.
pub fn strip_html(html: &str) -> String {
    if !html.contains(['<', '&']) {
        return collapse_whitespace(html);
    }

    let fragment = Html::parse_fragment(html);
    let mut text = String::with_capacity(html.len());
    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Text(t) => {
                let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
                    Node::Element(e) => HIDDEN_ELEMENTS.contains(&e.name()),
                    _ => false,
                });
                if !hidden {
                    text.push_str(t);
                }
            }
            Node::Element(e) if BREAKING_ELEMENTS.contains(&e.name()) => text.push(' '),
            _ => {}
        }
    }
    collapse_whitespace(&text)
}

/// Elements that separate the words around them.
const BREAKING_ELEMENTS: &[&str] = &["br", "p", "div", "li", "h1", "h2", "h3", "h4"];

/// Elements whose text content is never shown.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "template", "noscript"];

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
