//! Engine configuration, loadable from TOML. Every field has a default.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
}

impl EngineConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}

/// Intent scoring weights.
#[derive(Debug, Clone, Deserialize)]
pub struct MatcherConfig {
    /// A winner must score at least this much.
    #[serde(default = "default_min_score")]
    pub min_score: u32,
    #[serde(default = "default_intent_name_bonus")]
    pub intent_name_bonus: u32,
    #[serde(default = "default_category_bonus")]
    pub category_bonus: u32,
    /// Added per schema entity found in the query.
    #[serde(default = "default_entity_bonus")]
    pub entity_bonus: u32,
}

fn default_min_score() -> u32 {
    10
}
fn default_intent_name_bonus() -> u32 {
    50
}
fn default_category_bonus() -> u32 {
    30
}
fn default_entity_bonus() -> u32 {
    10
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            intent_name_bonus: default_intent_name_bonus(),
            category_bonus: default_category_bonus(),
            entity_bonus: default_entity_bonus(),
        }
    }
}

/// Query execution settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
    /// Row cap applied when the caller passes none. Unset means no cap.
    #[serde(default)]
    pub max_rows: Option<u64>,
}

fn default_query_timeout_secs() -> u64 {
    30
}

impl ExecutorConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            query_timeout_secs: default_query_timeout_secs(),
            max_rows: None,
        }
    }
}

/// Where rules come from and how often they are reloaded.
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    /// TOML rule file. When unset the database (or bundled sample) is used.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

fn default_refresh_interval_secs() -> u64 {
    300
}

impl RulesConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            path: None,
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

/// Conversational fallback settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FallbackConfig {
    #[serde(default)]
    pub enabled: bool,
    /// OpenAI-compatible API base URL (without `/chat/completions`).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the bearer token.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,
    #[serde(default = "default_health_interval_secs")]
    pub health_interval_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_base_url() -> String {
    "https://api.deepseek.com/v1".into()
}
fn default_model() -> String {
    "deepseek-chat".into()
}
fn default_api_key_env() -> String {
    "QL_CHAT_API_KEY".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_call_timeout_secs() -> u64 {
    30
}
fn default_health_timeout_secs() -> u64 {
    5
}
fn default_health_interval_secs() -> u64 {
    300
}

impl FallbackConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs)
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            call_timeout_secs: default_call_timeout_secs(),
            health_timeout_secs: default_health_timeout_secs(),
            health_interval_secs: default_health_interval_secs(),
            retry: RetryConfig::default(),
        }
    }
}

/// Retry settings for the conversational call.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    1000
}
fn default_multiplier() -> f64 {
    2.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}
