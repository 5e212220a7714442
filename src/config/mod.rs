mod file_config;

pub use file_config::{FileConfig, StatementFileConfig, UpstreamConfig};

use crate::dedup::IdentityKey;
use crate::resolver::{ResolverSettings, DEFAULT_SEARCH_LIMIT};
use crate::server::RequestsLoggingLevel;
use crate::statement::{StatementConfig, DEFAULT_TABLE};
use crate::upstream::{WikipediaConfig, DEFAULT_BASE_URL_TEMPLATE, DEFAULT_USER_AGENT};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

const MAX_SEARCH_LIMIT: usize = 50;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub upstream_timeout_sec: u64,
    pub api_base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub db_path: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,

    // Feature configs (with defaults)
    pub upstream: UpstreamSettings,
    pub statement: StatementSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamSettings {
    pub languages: Vec<String>,
    pub search_limit: usize,
    pub timeout_sec: u64,
    pub user_agent: String,
    pub base_url_template: String,
    pub identity_key: IdentityKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementSettings {
    pub table: String,
    pub schema: Option<String>,
    pub api_base_url: String,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via --db-path or in config file")
            })?;

        if db_path.is_dir() {
            bail!("db_path is a directory: {:?}", db_path);
        }
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                bail!("Database directory does not exist: {:?}", parent);
            }
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);
        if port == metrics_port && port != 0 {
            bail!("port and metrics_port must differ (both {})", port);
        }

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        // Upstream settings - merge file config with CLI and defaults
        let up_file = file.upstream.unwrap_or_default();
        let languages = up_file
            .languages
            .unwrap_or_else(|| vec!["ko".to_string(), "en".to_string()]);
        if languages.is_empty() || languages.iter().any(|l| l.trim().is_empty()) {
            bail!("upstream.languages must list at least one non-empty language code");
        }
        let search_limit = up_file.search_limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        if search_limit == 0 || search_limit > MAX_SEARCH_LIMIT {
            bail!(
                "upstream.search_limit must be between 1 and {}, got {}",
                MAX_SEARCH_LIMIT,
                search_limit
            );
        }
        let timeout_sec = up_file.timeout_sec.unwrap_or(cli.upstream_timeout_sec);
        if timeout_sec == 0 {
            bail!("upstream timeout must be at least 1 second");
        }
        let base_url_template = up_file
            .base_url_template
            .unwrap_or_else(|| DEFAULT_BASE_URL_TEMPLATE.to_string());
        if !base_url_template.contains("{lang}") {
            bail!("upstream.base_url_template must contain a {{lang}} placeholder");
        }
        let identity_key = match up_file.identity_key.as_deref() {
            None | Some("name") => IdentityKey::Name,
            Some("name_and_agency") => IdentityKey::NameAndAgency,
            Some(other) => bail!("Unknown upstream.identity_key '{}'", other),
        };
        let upstream = UpstreamSettings {
            languages,
            search_limit,
            timeout_sec,
            user_agent: up_file
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            base_url_template,
            identity_key,
        };

        // Statement settings
        let st_file = file.statement.unwrap_or_default();
        let table = st_file.table.unwrap_or_else(|| DEFAULT_TABLE.to_string());
        if table.trim().is_empty() {
            bail!("statement.table must not be empty");
        }
        let statement = StatementSettings {
            table,
            schema: st_file.schema.filter(|s| !s.trim().is_empty()),
            api_base_url: st_file
                .api_base_url
                .or_else(|| cli.api_base_url.clone())
                .unwrap_or_else(|| format!("http://localhost:{}", port)),
        };

        Ok(Self {
            db_path,
            port,
            metrics_port,
            logging_level,
            upstream,
            statement,
        })
    }

    pub fn statement_config(&self) -> StatementConfig {
        StatementConfig {
            table: self.statement.table.clone(),
            schema: self.statement.schema.clone(),
            api_base_url: self.statement.api_base_url.clone(),
        }
    }

    pub fn wikipedia_config(&self) -> WikipediaConfig {
        WikipediaConfig {
            languages: self.upstream.languages.clone(),
            base_url_template: self.upstream.base_url_template.clone(),
            user_agent: self.upstream.user_agent.clone(),
            timeout: Duration::from_secs(self.upstream.timeout_sec),
        }
    }

    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            timeout: Duration::from_secs(self.upstream.timeout_sec),
            search_limit: self.upstream.search_limit,
            identity_key: self.upstream.identity_key,
        }
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
