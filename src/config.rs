use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "CARD_SNIPER_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Catalog identity of a set as known by the sales upstream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SetMapping {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardConfig {
    pub set_name: String,
    pub card_number: String,
    /// Catalog card id (e.g. "base1-4"); enables the market-price feed.
    #[serde(default)]
    pub catalog_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalesApi {
    #[default]
    Rest,
    Graphql,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    pub analytics_ttl_seconds: i64,
    pub upstream_ttl_seconds: i64,
    pub rate_limit_window_seconds: i64,
    pub rate_limit_max: u32,
    pub cleanup_interval_seconds: u64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            analytics_ttl_seconds: 30 * 60,
            upstream_ttl_seconds: 24 * 60 * 60,
            rate_limit_window_seconds: 60,
            rate_limit_max: 10,
            cleanup_interval_seconds: 300,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Host serving `/api/graphql`; used when `sales_api` is `graphql`.
    #[serde(default = "default_graphql_base_url")]
    pub graphql_base_url: String,
    #[serde(default = "default_catalog_base_url")]
    pub catalog_base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub catalog_api_key: Option<String>,
    #[serde(default)]
    pub sales_api: SalesApi,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    pub check_interval_seconds: u64,
    #[serde(default)]
    pub governor: GovernorConfig,
    #[serde(default)]
    pub set_mapping: HashMap<String, SetMapping>,
    #[serde(default)]
    pub cards: Vec<CardConfig>,
}

fn default_api_base_url() -> String {
    "https://www.pokedata.io/api/v1".to_string()
}

fn default_graphql_base_url() -> String {
    "https://www.pokedata.io".to_string()
}

fn default_catalog_base_url() -> String {
    "https://api.pokemontcg.io/v2".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config = parse_config(&content)?;

    // Keys from the environment win over the file.
    if let Ok(key) = std::env::var("POKEDATA_API_KEY") {
        config.api_key = Some(key);
    }
    if let Ok(key) = std::env::var("POKEMON_TCG_API_KEY") {
        config.catalog_api_key = Some(key);
    }
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    Ok(serde_json::from_str(content)?)
}
