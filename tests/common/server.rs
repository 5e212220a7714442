//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own artist database and the
//! fixture encyclopedia in place of Wikipedia.

use super::constants::*;
use super::fixtures::FixtureEncyclopedia;
use artist_registry_server::artist_store::{ArtistStore, SqliteArtistStore};
use artist_registry_server::dedup::IdentityKey;
use artist_registry_server::resolver::{ArtistResolver, ResolverSettings};
use artist_registry_server::server::{make_app, RequestsLoggingLevel, ServerConfig, ServerState};
use artist_registry_server::statement::StatementConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with an isolated database
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// Artist store for direct database access in tests
    pub store: Arc<SqliteArtistStore>,

    /// Path of the SQLite file behind `store`
    pub db_path: PathBuf,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if the database cannot be created, the port cannot be bound or
    /// the server doesn't become ready within timeout.
    pub async fn spawn() -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_db_dir.path().join("artists.db");
        let store =
            Arc::new(SqliteArtistStore::new(&db_path).expect("Failed to open artist store"));

        let encyclopedia = Arc::new(FixtureEncyclopedia::new());
        let resolver = Arc::new(ArtistResolver::new(
            encyclopedia.clone(),
            encyclopedia,
            store.clone() as Arc<dyn ArtistStore>,
            ResolverSettings {
                timeout: Duration::from_millis(UPSTREAM_TIMEOUT_MS),
                search_limit: 5,
                identity_key: IdentityKey::Name,
            },
        ));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let state = ServerState::new(
            ServerConfig {
                requests_logging_level: RequestsLoggingLevel::None,
                port,
                metrics_port: 0,
            },
            store.clone() as Arc<dyn ArtistStore>,
            resolver,
            StatementConfig {
                api_base_url: API_BASE_URL.to_string(),
                ..Default::default()
            },
        );
        let app = make_app(state);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            store,
            db_path,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Inserts rows straight into the database, bypassing the store's
    /// duplicate check. Returns the new ids.
    pub fn insert_raw_artists(&self, names: &[&str]) -> Vec<i64> {
        let conn = rusqlite::Connection::open(&self.db_path).expect("Failed to open database");
        names
            .iter()
            .map(|name| {
                conn.execute(
                    "INSERT INTO artists (name, normalized_name) VALUES (?1, ?2)",
                    rusqlite::params![name, name.trim().to_lowercase()],
                )
                .expect("Failed to insert artist");
                conn.last_insert_rowid()
            })
            .collect()
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
