pub mod browser;
pub mod detail;
pub mod http;
pub mod idle;
pub mod service;

use async_trait::async_trait;

use crate::error::ExtractError;
use crate::model::{DetailResult, SearchResult};

/// What a search page yielded once it was fetched and parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(SearchResult),
    /// The page parsed but carried no result header.
    NotFound,
}

#[async_trait]
pub trait SearchExtractor: Send + Sync {
    async fn search(&self, medicine: &str) -> Result<SearchOutcome, ExtractError>;
}

#[async_trait]
pub trait DetailExtractor: Send + Sync {
    async fn details(&self, url: &str) -> Result<DetailResult, ExtractError>;
}

/// Text of an element with surrounding whitespace removed.
pub(crate) fn element_text(node: &kuchikiki::NodeRef) -> String {
    node.text_contents().trim().to_string()
}

/// Approximates what a browser reports as `innerText` for inline content:
/// whitespace runs collapse to single spaces.
pub(crate) fn rendered_text(node: &kuchikiki::NodeRef) -> String {
    node.text_contents()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
