//! Artist record resolver.
//!
//! Given a free-text artist name, fetches search hits and a biography
//! summary, extracts a normalized [`ArtistProfile`] and checks the store for
//! an existing record. The search, the summary fetch and the store lookup run
//! concurrently, each bounded by the same timeout.

mod disambiguation;
mod extraction;
mod normalize;

pub use disambiguation::{is_entertainment_context, pick_candidate};
pub use extraction::extract_profile;
pub use normalize::{
    clean_refs, detect_status, normalize_nationality, parse_date, parse_gender, parse_height,
    KOREAN_NATIONALITY,
};

use crate::artist_store::{ArtistProfile, ArtistStore, StoreError, StoredArtist, ValidationError};
use crate::dedup::{classify, lookup_candidates, ExistenceCheck, IdentityKey};
use crate::server::metrics;
use crate::upstream::{ArticleSummary, SearchHit, SummaryProvider, UpstreamError, WebSearchProvider};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// A citation backing the resolved profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub profile: ArtistProfile,
    pub sources: Vec<Source>,
    pub exists: bool,
    pub matched_id: Option<i64>,
}

impl SearchOutcome {
    /// Outcome carrying only the name, used when nothing was found.
    pub fn minimal(name: &str) -> Self {
        Self {
            profile: ArtistProfile::new(name.trim()),
            sources: Vec::new(),
            exists: false,
            matched_id: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("No encyclopedia entry found for '{}'", .0.profile.name)]
    NotFound(Box<SearchOutcome>),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] UpstreamError),

    #[error("'{name}' matches {} stored artists", .ids.len())]
    AmbiguousMatch { name: String, ids: Vec<i64> },

    #[error("{0}")]
    Store(#[from] StoreError),
}

impl ResolveError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::Validation(_) => "validation",
            ResolveError::NotFound(_) => "not_found",
            ResolveError::UpstreamUnavailable(_) => "upstream_unavailable",
            ResolveError::AmbiguousMatch { .. } => "ambiguous",
            ResolveError::Store(_) => "store",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ResolverSettings {
    pub timeout: Duration,
    pub search_limit: usize,
    pub identity_key: IdentityKey,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            search_limit: DEFAULT_SEARCH_LIMIT,
            identity_key: IdentityKey::Name,
        }
    }
}

pub struct ArtistResolver {
    search: Arc<dyn WebSearchProvider>,
    summaries: Arc<dyn SummaryProvider>,
    store: Arc<dyn ArtistStore>,
    settings: ResolverSettings,
}

impl ArtistResolver {
    pub fn new(
        search: Arc<dyn WebSearchProvider>,
        summaries: Arc<dyn SummaryProvider>,
        store: Arc<dyn ArtistStore>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            search,
            summaries,
            store,
            settings,
        }
    }

    /// Runs an upstream call under the resolver timeout and records its latency.
    async fn timed_call<T, F>(&self, provider: &str, call: F) -> Result<T, UpstreamError>
    where
        F: Future<Output = Result<T, UpstreamError>>,
    {
        let start = Instant::now();
        let result = match tokio::time::timeout(self.settings.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::Timeout),
        };
        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        metrics::record_upstream_call(provider, outcome, start.elapsed());
        if let Err(e) = &result {
            warn!("{} call failed: {}", provider, e);
        }
        result
    }

    /// Store candidates for `name`. A lookup that outlives the resolver
    /// timeout counts as an unavailable upstream, like the other sub-fetches.
    async fn lookup_stored(&self, name: &str) -> Result<Vec<StoredArtist>, ResolveError> {
        let store = self.store.clone();
        let name = name.to_string();
        let start = Instant::now();
        let lookup = tokio::task::spawn_blocking(move || lookup_candidates(store.as_ref(), &name));

        match tokio::time::timeout(self.settings.timeout, lookup).await {
            Ok(Ok(result)) => Ok(result?),
            Ok(Err(join_error)) => Err(StoreError::Storage(format!(
                "existence lookup task failed: {}",
                join_error
            ))
            .into()),
            Err(_) => {
                let error = UpstreamError::Timeout;
                warn!("Existence lookup failed: {}", error);
                metrics::record_upstream_call("store", error.kind(), start.elapsed());
                Err(error.into())
            }
        }
    }

    /// Existence flags for `name`, or `AmbiguousMatch` when several stored
    /// artists share it.
    fn existence(
        &self,
        name: &str,
        stored: Vec<StoredArtist>,
        agency: Option<&str>,
    ) -> Result<(bool, Option<i64>), ResolveError> {
        match classify(stored, agency, self.settings.identity_key) {
            ExistenceCheck::New => Ok((false, None)),
            ExistenceCheck::Existing { id } => Ok((true, Some(id))),
            ExistenceCheck::Ambiguous { ids } => {
                info!("'{}' is ambiguous between artists {:?}", name, ids);
                Err(ResolveError::AmbiguousMatch {
                    name: name.to_string(),
                    ids,
                })
            }
        }
    }

    /// `NotFound` carrying the minimal outcome, with the existence flags
    /// still taken from the store.
    fn not_found(&self, name: &str, stored: Vec<StoredArtist>) -> ResolveError {
        let (exists, matched_id) = match self.existence(name, stored, None) {
            Ok(flags) => flags,
            Err(ambiguous) => return ambiguous,
        };
        ResolveError::NotFound(Box::new(SearchOutcome {
            exists,
            matched_id,
            ..SearchOutcome::minimal(name)
        }))
    }

    /// The page to build the profile from.
    ///
    /// A disambiguation page is replaced by the first entertainment-looking
    /// search hit. Without a direct page, the best search hit is used.
    async fn select_page(
        &self,
        direct: Option<ArticleSummary>,
        hits: &[SearchHit],
    ) -> Result<Option<ArticleSummary>, UpstreamError> {
        let candidate = match &direct {
            Some(page) if !page.is_disambiguation => return Ok(direct),
            Some(page) => {
                info!(
                    "'{}' is a disambiguation page, looking for an entertainer among {} hits",
                    page.title,
                    hits.len()
                );
                pick_candidate(hits, &page.title)
            }
            None => pick_candidate(hits, "").or_else(|| hits.first()),
        };

        let Some(candidate) = candidate else {
            return Ok(None);
        };
        debug!("Fetching summary of candidate '{}'", candidate.title);

        let page = self
            .timed_call(
                self.summaries.name(),
                self.summaries.summary(&candidate.title),
            )
            .await?;
        Ok(page.filter(|p| !p.is_disambiguation))
    }

    pub async fn resolve(&self, artist_name: &str) -> Result<SearchOutcome, ResolveError> {
        let name = artist_name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyField {
                field: "artistName",
            }
            .into());
        }

        let (hits, direct, stored) = tokio::join!(
            self.timed_call(
                self.search.name(),
                self.search.search(name, self.settings.search_limit)
            ),
            self.timed_call(self.summaries.name(), self.summaries.summary(name)),
            self.lookup_stored(name),
        );
        let hits = hits?;
        let direct = direct?;
        let stored = stored?;

        if hits.is_empty() && direct.is_none() {
            info!("Nothing found for '{}'", name);
            return Err(self.not_found(name, stored));
        }

        let Some(page) = self.select_page(direct, &hits).await? else {
            info!("No usable page for '{}'", name);
            return Err(self.not_found(name, stored));
        };

        let profile = extract_profile(name, &page);

        let mut sources: Vec<Source> = hits
            .iter()
            .map(|hit| Source {
                title: hit.title.clone(),
                uri: hit.uri.clone(),
            })
            .collect();
        if !sources.iter().any(|s| s.uri == page.page_uri) {
            sources.push(Source {
                title: page.title.clone(),
                uri: page.page_uri.clone(),
            });
        }

        let (exists, matched_id) =
            self.existence(name, stored, profile.current_agency_name.as_deref())?;

        info!(
            "Resolved '{}' from '{}' ({} sources, exists={})",
            name,
            page.title,
            sources.len(),
            exists
        );
        Ok(SearchOutcome {
            profile,
            sources,
            exists,
            matched_id,
        })
    }
}
