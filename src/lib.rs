//! Guardian Reader - A single-page news reader
//!
//! This crate fetches the latest articles from the Guardian content API,
//! maps them to article summaries and renders them as a list in a small web
//! interface, linking each entry to the full article.

pub mod article;
pub mod config;
pub mod fetcher;
pub mod loader;
pub mod parser;
pub mod query;
pub mod routes;
