use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use artist_registry_server::artist_store::{ArtistStore, SqliteArtistStore};
use artist_registry_server::config;
use artist_registry_server::resolver::ArtistResolver;
use artist_registry_server::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};
use artist_registry_server::upstream::WikipediaClient;

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite artists database file. Created if missing.
    /// Can also be specified in config file.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Timeout in seconds for each search, summary and lookup call.
    #[clap(long, default_value_t = 10)]
    pub upstream_timeout_sec: u64,

    /// Base URL the generated automation scripts send apply requests to.
    /// Defaults to this server on localhost.
    #[clap(long)]
    pub api_base_url: Option<String>,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_path: args.db_path.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            upstream_timeout_sec: args.upstream_timeout_sec,
            api_base_url: args.api_base_url.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = config::AppConfig::resolve(&config::CliConfig::from(&cli_args), file_config)?;

    info!("Opening SQLite artists database at {:?}...", app_config.db_path);
    let artist_store: Arc<dyn ArtistStore> = Arc::new(SqliteArtistStore::new(&app_config.db_path)?);

    info!("Initializing metrics...");
    metrics::init_metrics();
    metrics::set_stored_artists(artist_store.count(None)?);

    let wikipedia = Arc::new(
        WikipediaClient::new(app_config.wikipedia_config())
            .context("Failed to create Wikipedia client")?,
    );
    info!(
        "Wikipedia lookups in {:?}, timeout {}s",
        app_config.upstream.languages, app_config.upstream.timeout_sec
    );
    let resolver = Arc::new(ArtistResolver::new(
        wikipedia.clone(),
        wikipedia,
        artist_store.clone(),
        app_config.resolver_settings(),
    ));

    info!("Ready to serve at port {}!", app_config.port);
    info!("Metrics available at port {}!", app_config.metrics_port);
    run_server(
        ServerConfig {
            requests_logging_level: app_config.logging_level.clone(),
            port: app_config.port,
            metrics_port: app_config.metrics_port,
        },
        artist_store,
        resolver,
        app_config.statement_config(),
    )
    .await
}
