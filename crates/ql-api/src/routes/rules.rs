//! Rule catalog endpoints.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use ql_engine::rules::ReloadSummary;
use ql_protocol::Category;

use crate::error::ApiResult;
use crate::state::AppState;

/// One active rule, as listed.
#[derive(Debug, Serialize)]
pub struct RuleSummary {
    pub id: String,
    pub intent_name: String,
    pub category: Category,
    pub priority: i32,
    pub trigger_words: Vec<String>,
}

/// GET /api/v1/rules — active rules in selection order.
pub async fn list_rules(State(state): State<AppState>) -> Json<Vec<RuleSummary>> {
    let catalog = state.engine.rules().snapshot().await;
    let rules = catalog
        .list_active_rules()
        .iter()
        .map(|r| RuleSummary {
            id: r.id.clone(),
            intent_name: r.intent_name.clone(),
            category: r.category,
            priority: r.priority,
            trigger_words: r.trigger_words.clone(),
        })
        .collect();
    Json(rules)
}

/// POST /api/v1/rules/reload — re-read the configured rule source.
pub async fn reload_rules(State(state): State<AppState>) -> ApiResult<Json<ReloadSummary>> {
    let summary = state
        .engine
        .rules()
        .reload(state.rule_source.as_ref())
        .await
        .inspect_err(|e| {
            tracing::warn!(source = %state.rule_source.describe(), error = %e, "rule reload failed");
        })?;
    Ok(Json(summary))
}
