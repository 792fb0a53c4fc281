//! Shared application state for the Axum server.
//!
//! Supports two modes:
//! - **Database mode**: rows come from PostgreSQL through `PgDataStore`.
//! - **Sample mode**: bundled or file-backed rules over an in-memory
//!   `MockDataStore` (tests and development).

use std::path::PathBuf;
use std::sync::Arc;

use sqlx::PgPool;

use ql_engine::rules::source::{SAMPLE_RULES, parse_rules_toml};
use ql_engine::rules::{RuleCatalog, RuleSource, RuleStore, StaticRuleSource, TomlRuleSource};
use ql_engine::{DataStore, EngineConfig, FallbackOrchestrator, PgDataStore, QueryEngine, RuleError};

use crate::sample;

/// Shared application state, cheap to clone into handlers.
#[derive(Clone)]
pub struct AppState {
    /// The query pipeline.
    pub engine: Arc<QueryEngine>,
    /// Where `POST /rules/reload` re-reads rules from.
    pub rule_source: Arc<dyn RuleSource>,
}

impl AppState {
    pub fn new(engine: Arc<QueryEngine>, rule_source: Arc<dyn RuleSource>) -> Self {
        Self {
            engine,
            rule_source,
        }
    }

    /// Load rules from `rule_source` and wire up an engine over `store`.
    pub async fn build(
        rule_source: Arc<dyn RuleSource>,
        store: Arc<dyn DataStore>,
        fallback: Arc<FallbackOrchestrator>,
        config: &EngineConfig,
    ) -> Result<Self, RuleError> {
        let rules = Arc::new(RuleStore::load(rule_source.as_ref()).await?);
        let engine = QueryEngine::new(rules, store, fallback, config);
        Ok(Self::new(Arc::new(engine), rule_source))
    }

    /// Create state backed by a PostgreSQL pool.
    pub async fn with_pool(
        pool: PgPool,
        rule_source: Arc<dyn RuleSource>,
        fallback: Arc<FallbackOrchestrator>,
        config: &EngineConfig,
    ) -> Result<Self, RuleError> {
        let store = Arc::new(PgDataStore::new(pool));
        Self::build(rule_source, store, fallback, config).await
    }

    /// Bundled sample rules over sample rows, with the given fallback.
    pub fn sample(fallback: Arc<FallbackOrchestrator>, config: &EngineConfig) -> Result<Self, RuleError> {
        let catalog = RuleCatalog::build(parse_rules_toml(SAMPLE_RULES)?);
        let rules = Arc::new(RuleStore::new(catalog));
        let engine = QueryEngine::new(rules, Arc::new(sample::sample_store()), fallback, config);
        Ok(Self::new(Arc::new(engine), Arc::new(StaticRuleSource::sample()?)))
    }

    /// Sample rows with rules read from `rules_path` when given, otherwise
    /// the bundled sample rules.
    pub async fn sample_with_rules(
        rules_path: Option<PathBuf>,
        fallback: Arc<FallbackOrchestrator>,
        config: &EngineConfig,
    ) -> Result<Self, RuleError> {
        match rules_path {
            Some(path) => {
                let source = Arc::new(TomlRuleSource::new(path));
                Self::build(source, Arc::new(sample::sample_store()), fallback, config).await
            }
            None => Self::sample(fallback, config),
        }
    }

    /// Sample mode with the conversational fallback disabled.
    pub fn with_sample_data() -> Result<Self, RuleError> {
        Self::sample(Arc::new(FallbackOrchestrator::disabled()), &EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql_engine::MockDataStore;

    #[tokio::test]
    async fn sample_state_loads_bundled_rules() {
        let state = AppState::with_sample_data().unwrap();
        let catalog = state.engine.rules().snapshot().await;
        assert!(catalog.list_active_rules().len() >= 8);
        assert!(catalog.rejected().is_empty());
        assert_eq!(state.rule_source.describe(), "sample");
    }

    #[tokio::test]
    async fn sample_mode_reads_rules_file() {
        let rules = r#"
[[rules]]
id = "supplier-batch-count"
intent_name = "供应商批次统计"
category = "statistics"
trigger_words = ["批次统计"]
query_template = """
SELECT supplier_name, count(*) AS batches
FROM production_tracking
WHERE supplier_name = :supplier
GROUP BY supplier_name
"""
display_fields = [
    { field = "supplier", column = "supplier_name" },
    { field = "batches", column = "batches" },
]

[rules.entities.supplier]
values = ["聚龙", "欣冠"]
required = true
"#;
        let path = std::env::temp_dir().join(format!("ql-sample-rules-{}.toml", uuid::Uuid::now_v7()));
        std::fs::write(&path, rules).unwrap();

        let state = AppState::sample_with_rules(
            Some(path.clone()),
            Arc::new(FallbackOrchestrator::disabled()),
            &EngineConfig::default(),
        )
        .await;
        std::fs::remove_file(&path).unwrap();
        let state = state.unwrap();

        let catalog = state.engine.rules().snapshot().await;
        assert_eq!(catalog.list_active_rules().len(), 1);
        assert!(catalog.get("supplier-batch-count").is_some());
        assert!(state.rule_source.describe().starts_with("file:"));
    }

    #[tokio::test]
    async fn sample_mode_without_file_uses_bundled_rules() {
        let state = AppState::sample_with_rules(
            None,
            Arc::new(FallbackOrchestrator::disabled()),
            &EngineConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(state.rule_source.describe(), "sample");
    }

    #[tokio::test]
    async fn missing_rules_file_is_error() {
        let path = std::env::temp_dir().join(format!("ql-missing-{}.toml", uuid::Uuid::now_v7()));
        let result = AppState::sample_with_rules(
            Some(path),
            Arc::new(FallbackOrchestrator::disabled()),
            &EngineConfig::default(),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn build_from_source() {
        let rules = parse_rules_toml(SAMPLE_RULES).unwrap();
        let first = rules[0].id.clone();
        let source = Arc::new(StaticRuleSource::new(vec![rules[0].clone()]));
        let state = AppState::build(
            source,
            Arc::new(MockDataStore::default()),
            Arc::new(FallbackOrchestrator::disabled()),
            &EngineConfig::default(),
        )
        .await
        .unwrap();

        let catalog = state.engine.rules().snapshot().await;
        assert_eq!(catalog.list_active_rules().len(), 1);
        assert!(catalog.get(&first).is_some());
    }
}
