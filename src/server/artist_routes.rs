//! Artist API routes

use crate::apply::{ApplyError, ApplyRequest};
use crate::artist_store::{
    ArtistFilter, ArtistQuery, ArtistStatus, Gender, StoreError, StoredArtist,
};
use crate::resolver::{ResolveError, SearchOutcome};
use crate::statement::{generate, GeneratedArtifacts};

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::metrics::{record_apply_outcome, record_resolve_outcome, set_stored_artists};
use super::state::{GuardedApplyService, GuardedArtistStore, ServerState};

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_LIST_LIMIT: usize = 500;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SearchParams {
    artist_name: Option<String>,
}

/// Search result plus the artifacts generated from it.
#[derive(Serialize)]
struct SearchResponse {
    #[serde(flatten)]
    outcome: SearchOutcome,
    #[serde(flatten)]
    artifacts: GeneratedArtifacts,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    candidates: Option<Vec<i64>>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            candidates: None,
        }
    }
}

#[derive(Serialize)]
struct ApplyResponse {
    ok: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
}

impl ApplyResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            id: None,
        }
    }
}

#[derive(Deserialize, Debug)]
struct ListParams {
    query: Option<String>,
    status: Option<ArtistStatus>,
    gender: Option<Gender>,
    nationality: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

#[derive(Serialize)]
struct ListResponse {
    artists: Vec<StoredArtist>,
    total: usize,
}

fn internal_error(message: &str) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::new(message))).into_response()
}

/// Runs a blocking store read off the async runtime.
async fn read_store<T, F>(store: GuardedArtistStore, read: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce(&GuardedArtistStore) -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || read(&store))
        .await
        .map_err(|e| StoreError::Storage(format!("store task failed: {}", e)))?
}

async fn search_artist(
    State(state): State<ServerState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let artist_name = params.artist_name.unwrap_or_default();

    let (status, outcome) = match state.resolver.resolve(&artist_name).await {
        Ok(outcome) => {
            record_resolve_outcome(if outcome.exists { "existing" } else { "new" });
            (StatusCode::OK, outcome)
        }
        Err(ResolveError::NotFound(outcome)) => {
            record_resolve_outcome("not_found");
            (StatusCode::NOT_FOUND, *outcome)
        }
        Err(err) => {
            record_resolve_outcome(err.kind());
            return resolve_error_response(err);
        }
    };

    match generate(
        &outcome.profile,
        outcome.exists,
        outcome.matched_id,
        &state.statement_config,
    ) {
        Ok(artifacts) => (status, Json(SearchResponse { outcome, artifacts })).into_response(),
        Err(err) => {
            error!(
                "Failed to generate artifacts for '{}': {}",
                outcome.profile.name, err
            );
            internal_error("Failed to generate statement")
        }
    }
}

fn resolve_error_response(err: ResolveError) -> Response {
    match err {
        ResolveError::Validation(e) => {
            (StatusCode::BAD_REQUEST, Json(ErrorBody::new(e.to_string()))).into_response()
        }
        ResolveError::AmbiguousMatch { name, ids } => (
            StatusCode::CONFLICT,
            Json(ErrorBody {
                error: format!("'{}' matches more than one stored artist", name),
                candidates: Some(ids),
            }),
        )
            .into_response(),
        ResolveError::UpstreamUnavailable(e) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorBody::new(format!("Upstream unavailable ({})", e.kind()))),
        )
            .into_response(),
        ResolveError::Store(e) => {
            error!("Existence lookup failed: {}", e);
            internal_error("Existence lookup failed")
        }
        // handled by the caller, kept for exhaustiveness
        ResolveError::NotFound(outcome) => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody::new(format!(
                "No encyclopedia entry found for '{}'",
                outcome.profile.name
            ))),
        )
            .into_response(),
    }
}

async fn apply_artist(
    State(service): State<GuardedApplyService>,
    State(store): State<GuardedArtistStore>,
    payload: Result<Json<ApplyRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            record_apply_outcome("validation");
            return (
                StatusCode::BAD_REQUEST,
                Json(ApplyResponse::failure(rejection.body_text())),
            )
                .into_response();
        }
    };

    match service.apply(request).await {
        Ok(outcome) => {
            record_apply_outcome(if outcome.created { "inserted" } else { "updated" });
            refresh_stored_artists_gauge(store).await;
            Json(ApplyResponse {
                ok: true,
                message: outcome.message,
                id: Some(outcome.id),
            })
            .into_response()
        }
        Err(err) => {
            record_apply_outcome(err.kind());
            apply_error_response(err)
        }
    }
}

fn apply_error_response(err: ApplyError) -> Response {
    let status = match &err {
        ApplyError::Validation(_) => StatusCode::BAD_REQUEST,
        ApplyError::Persistence(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
        ApplyError::Persistence(StoreError::DuplicateName(_))
        | ApplyError::Persistence(StoreError::Constraint(_)) => StatusCode::CONFLICT,
        ApplyError::Persistence(StoreError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = match &err {
        ApplyError::Persistence(StoreError::Storage(_)) => "Failed to persist artist".to_string(),
        other => other.to_string(),
    };
    (status, Json(ApplyResponse::failure(message))).into_response()
}

async fn refresh_stored_artists_gauge(store: GuardedArtistStore) {
    match read_store(store, |s| s.count(None)).await {
        Ok(count) => set_stored_artists(count),
        Err(e) => debug!("Could not refresh stored artists gauge: {}", e),
    }
}

async fn list_artists(
    State(store): State<GuardedArtistStore>,
    Query(params): Query<ListParams>,
) -> Response {
    let non_blank = |v: Option<String>| v.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let filter = ArtistFilter {
        text: non_blank(params.query),
        status: params.status,
        gender: params.gender,
        nationality: non_blank(params.nationality),
    };
    let query = ArtistQuery {
        filter,
        limit: params
            .limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT),
        offset: params.offset.unwrap_or(0),
    };

    let result = read_store(store, move |s| {
        let artists = s.list(&query)?;
        let total = s.count(Some(&query.filter))?;
        Ok(ListResponse { artists, total })
    })
    .await;

    match result {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            error!("Failed to list artists: {}", e);
            internal_error("Failed to list artists")
        }
    }
}

async fn get_artist(State(store): State<GuardedArtistStore>, Path(id): Path<i64>) -> Response {
    match read_store(store, move |s| s.get(id)).await {
        Ok(Some(artist)) => Json(artist).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody::new(format!("Artist {} not found", id))),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to load artist {}: {}", id, e);
            internal_error("Failed to load artist")
        }
    }
}

pub fn make_artist_routes(state: ServerState) -> Router {
    Router::new()
        .route("/v1/artists", get(list_artists))
        .route("/v1/artists/search", get(search_artist))
        .route("/v1/artists/apply", post(apply_artist))
        .route("/v1/artists/{id}", get(get_artist))
        .with_state(state)
}
