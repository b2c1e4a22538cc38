//! Web search boundary

pub mod tavily;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use tavily::TavilyClient;

/// Default number of results requested per search
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Errors raised by a search backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("search API key is not configured")]
    MissingApiKey,

    #[error("search request failed with HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("search transport failure: {0}")]
    Transport(String),

    #[error("unexpected search response: {0}")]
    InvalidResponse(String),
}

impl SearchError {
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => SearchError::Http {
                status: status.as_u16(),
                message: error.to_string(),
            },
            None if error.is_decode() => SearchError::InvalidResponse(error.to_string()),
            None => SearchError::Transport(error.to_string()),
        }
    }
}

/// A single web search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Trait for web search backends
#[async_trait]
pub trait WebSearchClient: Send + Sync {
    async fn search(&self, query: &str, max_results: usize)
        -> Result<Vec<SearchResult>, SearchError>;
}

/// Render search hits as a numbered list for inclusion in a prompt
pub fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "(la búsqueda web no devolvió resultados)".to_string();
    }

    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {} ({})\n   {}", i + 1, r.title, r.url, r.snippet.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}
