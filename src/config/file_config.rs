use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_path: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,

    // Feature configs
    pub upstream: Option<UpstreamConfig>,
    pub statement: Option<StatementFileConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Encyclopedia language editions, tried in order.
    pub languages: Option<Vec<String>>,
    pub search_limit: Option<usize>,
    pub timeout_sec: Option<u64>,
    pub user_agent: Option<String>,
    /// Site root with a `{lang}` placeholder.
    pub base_url_template: Option<String>,
    /// "name" or "name_and_agency"
    pub identity_key: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct StatementFileConfig {
    pub table: Option<String>,
    pub schema: Option<String>,
    pub api_base_url: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
