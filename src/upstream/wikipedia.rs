//! Wikipedia-backed search and summary provider.
//!
//! Search uses the MediaWiki action API (`list=search`), summaries come from
//! the REST endpoint `/api/rest_v1/page/summary/{title}` and the full page
//! text from `prop=extracts&explaintext`. Languages are tried in the
//! configured order and the first language with a result wins.

use super::models::{ArticleSummary, SearchHit};
use super::provider::{SummaryProvider, UpstreamError, WebSearchProvider};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL_TEMPLATE: &str = "https://{lang}.wikipedia.org";
pub const DEFAULT_USER_AGENT: &str = "artist-registry-server/0.1 (artist back office)";

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").expect("valid regex");
}

#[derive(Clone, Debug)]
pub struct WikipediaConfig {
    /// Language editions in lookup order, e.g. `["ko", "en"]`.
    pub languages: Vec<String>,
    /// Site root with a `{lang}` placeholder.
    pub base_url_template: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            languages: vec!["ko".to_string(), "en".to_string()],
            base_url_template: DEFAULT_BASE_URL_TEMPLATE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

pub struct WikipediaClient {
    client: Client,
    config: WikipediaConfig,
}

// Wire formats

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    title: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Debug, Deserialize)]
struct RestSummary {
    title: String,
    #[serde(default)]
    extract: String,
    #[serde(rename = "type", default)]
    page_type: String,
    thumbnail: Option<Thumbnail>,
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    source: String,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: Option<PageUrls>,
}

#[derive(Debug, Deserialize)]
struct PageUrls {
    page: String,
}

#[derive(Debug, Deserialize)]
struct ExtractsResponse {
    query: Option<ExtractsQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractsQuery {
    #[serde(default)]
    pages: Vec<ExtractPage>,
}

#[derive(Debug, Deserialize)]
struct ExtractPage {
    #[serde(default)]
    extract: Option<String>,
}

/// Strip search-match markup and decode the handful of entities MediaWiki
/// emits in snippets.
fn clean_snippet(snippet: &str) -> String {
    HTML_TAG
        .replace_all(snippet, "")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn title_path_segment(title: &str) -> String {
    urlencoding::encode(&title.replace(' ', "_")).into_owned()
}

impl WikipediaClient {
    pub fn new(config: WikipediaConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    pub fn languages(&self) -> &[String] {
        &self.config.languages
    }

    fn base_url(&self, lang: &str) -> String {
        self.config
            .base_url_template
            .replace("{lang}", lang)
            .trim_end_matches('/')
            .to_string()
    }

    fn page_uri(&self, lang: &str, title: &str) -> String {
        format!("{}/wiki/{}", self.base_url(lang), title_path_segment(title))
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, UpstreamError> {
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(UpstreamError::Api {
                status: status.as_u16(),
            });
        }

        let body = response.json::<T>().await.map_err(|e| {
            UpstreamError::InvalidResponse(format!("Failed to parse response from {}: {}", url, e))
        })?;
        Ok(Some(body))
    }

    async fn search_in(
        &self,
        lang: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, UpstreamError> {
        let url = format!("{}/w/api.php", self.base_url(lang));
        let limit = limit.to_string();
        let response: Option<SearchResponse> = self
            .get_json(
                &url,
                &[
                    ("action", "query"),
                    ("list", "search"),
                    ("srsearch", query),
                    ("srlimit", &limit),
                    ("format", "json"),
                    ("utf8", "1"),
                ],
            )
            .await?;

        let entries = response
            .and_then(|r| r.query)
            .map(|q| q.search)
            .unwrap_or_default();

        Ok(entries
            .into_iter()
            .map(|entry| SearchHit {
                uri: self.page_uri(lang, &entry.title),
                snippet: clean_snippet(&entry.snippet),
                title: entry.title,
                lang: lang.to_string(),
            })
            .collect())
    }

    async fn page_text(&self, lang: &str, title: &str) -> Result<Option<String>, UpstreamError> {
        let url = format!("{}/w/api.php", self.base_url(lang));
        let response: Option<ExtractsResponse> = self
            .get_json(
                &url,
                &[
                    ("action", "query"),
                    ("prop", "extracts"),
                    ("explaintext", "1"),
                    ("redirects", "1"),
                    ("titles", title),
                    ("format", "json"),
                    ("formatversion", "2"),
                ],
            )
            .await?;

        Ok(response
            .and_then(|r| r.query)
            .and_then(|q| q.pages.into_iter().next())
            .and_then(|p| p.extract)
            .filter(|text| !text.is_empty()))
    }

    async fn summary_in(
        &self,
        lang: &str,
        title: &str,
    ) -> Result<Option<ArticleSummary>, UpstreamError> {
        let url = format!(
            "{}/api/rest_v1/page/summary/{}",
            self.base_url(lang),
            title_path_segment(title)
        );
        let Some(rest) = self.get_json::<RestSummary>(&url, &[]).await? else {
            return Ok(None);
        };

        let is_disambiguation = rest.page_type.eq_ignore_ascii_case("disambiguation");
        let content = if is_disambiguation {
            None
        } else {
            self.page_text(lang, &rest.title).await?
        };
        let page_uri = rest
            .content_urls
            .and_then(|urls| urls.desktop)
            .map(|desktop| desktop.page)
            .unwrap_or_else(|| self.page_uri(lang, &rest.title));

        Ok(Some(ArticleSummary {
            title: rest.title,
            lang: lang.to_string(),
            extract: rest.extract,
            content,
            page_uri,
            thumbnail: rest.thumbnail.map(|t| t.source),
            is_disambiguation,
        }))
    }
}

#[async_trait]
impl WebSearchProvider for WikipediaClient {
    fn name(&self) -> &str {
        "wikipedia_search"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, UpstreamError> {
        for lang in &self.config.languages {
            let hits = self.search_in(lang, query, limit).await?;
            debug!(lang = %lang, query = %query, hits = hits.len(), "Wikipedia search");
            if !hits.is_empty() {
                return Ok(hits);
            }
        }
        Ok(Vec::new())
    }
}

#[async_trait]
impl SummaryProvider for WikipediaClient {
    fn name(&self) -> &str {
        "wikipedia_summary"
    }

    async fn summary(&self, title: &str) -> Result<Option<ArticleSummary>, UpstreamError> {
        for lang in &self.config.languages {
            if let Some(summary) = self.summary_in(lang, title).await? {
                debug!(
                    lang = %lang,
                    title = %summary.title,
                    disambiguation = summary.is_disambiguation,
                    "Wikipedia summary found"
                );
                return Ok(Some(summary));
            }
        }
        Ok(None)
    }
}
