//! QualityLens API — natural-language query server.
//!
//! Serves structured QMS answers over HTTP, with a conversational
//! fallback for questions no intent rule covers.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use ql_api::config::ApiConfig;
use ql_api::state::AppState;
use ql_api::{db, routes};
use ql_engine::fallback::monitor;
use ql_engine::rules::{PgRuleSource, RuleSource, TomlRuleSource, refresh};
use ql_engine::{EngineConfig, FallbackOrchestrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "ql-api starting");

    let config = ApiConfig::from_env()?;
    let engine_config = match &config.engine_config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    let fallback = Arc::new(FallbackOrchestrator::from_config(&engine_config.fallback));

    let rules_path = config
        .rules_path
        .clone()
        .map(PathBuf::from)
        .or_else(|| engine_config.rules.path.clone());

    // Connect to PostgreSQL if DATABASE_URL is set, otherwise serve sample data.
    let state = if let Some(database_url) = &config.database_url {
        tracing::info!("connecting to PostgreSQL");
        let pool = db::connect(database_url).await?;
        let source: Arc<dyn RuleSource> = match rules_path {
            Some(path) => Arc::new(TomlRuleSource::new(path)),
            None => Arc::new(PgRuleSource::new(pool.clone())),
        };
        AppState::with_pool(pool, source, fallback.clone(), &engine_config).await?
    } else {
        tracing::warn!(rules = ?rules_path, "DATABASE_URL not set, serving sample data");
        AppState::sample_with_rules(rules_path, fallback.clone(), &engine_config).await?
    };

    tokio::spawn(refresh::run(
        state.engine.rules().clone(),
        state.rule_source.clone(),
        engine_config.rules.refresh_interval(),
    ));
    tokio::spawn(monitor::run(fallback, engine_config.fallback.health_interval()));

    let app = routes::build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
