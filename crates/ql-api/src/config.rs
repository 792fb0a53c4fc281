//! API server configuration.

use serde::Deserialize;

/// Top-level API server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Listen address (e.g., "0.0.0.0").
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// PostgreSQL connection URL. Unset means in-memory sample mode.
    pub database_url: Option<String>,
    /// Engine TOML config path (QL_CONFIG).
    pub engine_config: Option<String>,
    /// Rule TOML path (QL_RULES). Takes precedence over the database.
    pub rules_path: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl ApiConfig {
    /// Load config from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let port = match var("QL_PORT") {
            Some(p) => p
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid QL_PORT '{p}': {e}"))?,
            None => default_port(),
        };
        Ok(Self {
            host: var("QL_HOST").unwrap_or_else(default_host),
            port,
            database_url: var("DATABASE_URL"),
            engine_config: var("QL_CONFIG"),
            rules_path: var("QL_RULES"),
        })
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: None,
            engine_config: None,
            rules_path: None,
        }
    }
}
