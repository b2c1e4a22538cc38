//! Tavily search client

use crate::search::{SearchError, SearchResult, WebSearchClient};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyHit>,
}

#[derive(Debug, Deserialize)]
struct TavilyHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

impl From<TavilyHit> for SearchResult {
    fn from(hit: TavilyHit) -> Self {
        SearchResult {
            title: hit.title,
            url: hit.url,
            snippet: hit.content,
        }
    }
}

/// Web search through the Tavily API
#[derive(Clone)]
pub struct TavilyClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for TavilyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavilyClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl TavilyClient {
    pub fn new(api_key: Option<String>, timeout_secs: u64) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: DEFAULT_TAVILY_ENDPOINT.to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    /// Build from `TAVILY_API_KEY`
    pub fn from_env(timeout_secs: u64) -> Result<Self, SearchError> {
        Self::new(std::env::var("TAVILY_API_KEY").ok(), timeout_secs)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl WebSearchClient for TavilyClient {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let api_key = self.api_key.as_deref().ok_or(SearchError::MissingApiKey)?;

        let body = TavilyRequest {
            api_key,
            query,
            max_results,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(SearchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(%status, "Tavily search failed");
            return Err(SearchError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: TavilyResponse = response.json().await.map_err(SearchError::from_reqwest)?;
        let results: Vec<SearchResult> = parsed
            .results
            .into_iter()
            .take(max_results)
            .map(SearchResult::from)
            .collect();

        debug!(query_len = query.len(), hits = results.len(), "Tavily search completed");
        Ok(results)
    }
}
