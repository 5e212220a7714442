use anyhow::{Context, Result};
use std::future::IntoFuture;
use std::time::Duration;

use axum::{extract::State, middleware, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use tracing::info;

use crate::artist_store::ArtistStore;
use crate::resolver::ArtistResolver;
use crate::statement::StatementConfig;
use std::sync::Arc;

use super::metrics::metrics_handler;
use super::{log_requests, make_artist_routes, state::ServerState, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: &'static str,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    Json(ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn make_app(state: ServerState) -> Router {
    let home_router: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone());

    home_router
        .merge(make_artist_routes(state.clone()))
        .layer(middleware::from_fn_with_state(state, log_requests))
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(
    config: ServerConfig,
    artist_store: Arc<dyn ArtistStore>,
    resolver: Arc<ArtistResolver>,
    statement_config: StatementConfig,
) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let state = ServerState::new(config, artist_store, resolver, statement_config);
    let app = make_app(state);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;
    info!("Listening on {:?}", listener.local_addr()?);

    tokio::select! {
        result = axum::serve(listener, app).into_future() => {
            info!("HTTP server stopped: {:?}", result);
            result?;
        }
        result = axum::serve(metrics_listener, make_metrics_app()).into_future() => {
            info!("Metrics server stopped: {:?}", result);
            result?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artist_store::SqliteArtistStore;
    use crate::resolver::ResolverSettings;
    use crate::upstream::{
        ArticleSummary, SearchHit, SummaryProvider, UpstreamError, WebSearchProvider,
    };
    use async_trait::async_trait;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt; // for `oneshot`

    struct NothingFound;

    #[async_trait]
    impl WebSearchProvider for NothingFound {
        fn name(&self) -> &str {
            "nothing"
        }

        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchHit>, UpstreamError> {
            Ok(vec![])
        }
    }

    #[async_trait]
    impl SummaryProvider for NothingFound {
        fn name(&self) -> &str {
            "nothing"
        }

        async fn summary(&self, _title: &str) -> Result<Option<ArticleSummary>, UpstreamError> {
            Ok(None)
        }
    }

    fn test_app() -> (Router, TempDir) {
        let dir = TempDir::new().unwrap();
        let store: Arc<dyn ArtistStore> =
            Arc::new(SqliteArtistStore::new(dir.path().join("artists.db")).unwrap());
        let resolver = Arc::new(ArtistResolver::new(
            Arc::new(NothingFound),
            Arc::new(NothingFound),
            store.clone(),
            ResolverSettings::default(),
        ));
        let state = ServerState::new(
            ServerConfig {
                requests_logging_level: super::super::RequestsLoggingLevel::None,
                ..Default::default()
            },
            store,
            resolver,
            StatementConfig::default(),
        );
        (make_app(state), dir)
    }

    async fn status_of(app: &Router, request: Request<Body>) -> StatusCode {
        app.clone().oneshot(request).await.unwrap().status()
    }

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(Duration::from_secs(59)), "0d 00:00:59");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 01:01:01");
    }

    #[tokio::test]
    async fn routes_respond_with_expected_statuses() {
        let (app, _dir) = test_app();

        let get = |uri: &str| Request::builder().uri(uri).body(Body::empty()).unwrap();

        assert_eq!(status_of(&app, get("/")).await, StatusCode::OK);
        assert_eq!(status_of(&app, get("/v1/artists")).await, StatusCode::OK);
        assert_eq!(
            status_of(&app, get("/v1/artists/search?artistName=%20")).await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(&app, get("/v1/artists/search?artistName=Nobody")).await,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(&app, get("/v1/artists/12")).await,
            StatusCode::NOT_FOUND
        );

        let malformed = Request::builder()
            .method("POST")
            .uri("/v1/artists/apply")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        assert_eq!(status_of(&app, malformed).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_text() {
        super::super::metrics::init_metrics();
        let request = Request::builder()
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();
        let response = make_metrics_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
