//! Provider traits for the external knowledge sources.

use super::models::{ArticleSummary, SearchHit};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to an upstream provider.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status})")]
    Api { status: u16 },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Timeout => "timeout",
            UpstreamError::Connection(_) => "connection",
            UpstreamError::Api { .. } => "api",
            UpstreamError::InvalidResponse(_) => "invalid_response",
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Timeout
        } else if e.is_decode() {
            UpstreamError::InvalidResponse(e.to_string())
        } else {
            UpstreamError::Connection(e.to_string())
        }
    }
}

/// Ranked web search.
#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    /// Provider name for logs and metrics.
    fn name(&self) -> &str;

    /// Up to `limit` hits, most relevant first. No hits is `Ok(vec![])`.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, UpstreamError>;
}

/// Biography summaries by page title.
#[async_trait]
pub trait SummaryProvider: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` when no page with this title exists.
    async fn summary(&self, title: &str) -> Result<Option<ArticleSummary>, UpstreamError>;
}
