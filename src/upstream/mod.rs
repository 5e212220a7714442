//! External knowledge sources.
//!
//! The resolver only sees the [`WebSearchProvider`] and [`SummaryProvider`]
//! traits; [`WikipediaClient`] implements both against the MediaWiki APIs.

mod models;
mod provider;
mod wikipedia;

pub use models::{ArticleSummary, SearchHit};
pub use provider::{SummaryProvider, UpstreamError, WebSearchProvider};
pub use wikipedia::{
    WikipediaClient, WikipediaConfig, DEFAULT_BASE_URL_TEMPLATE, DEFAULT_USER_AGENT,
};
