//! The `answer_query` pipeline.
//!
//! extract → match → (bind → execute → normalize) | fallback
//!
//! Exactly one of the two branches runs per request. Every outcome,
//! including failures, comes back as a [`QueryResponse`].

use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use ql_protocol::{EntityMap, ErrorCode, QueryResponse};

use crate::binder::{self, BoundQuery};
use crate::config::EngineConfig;
use crate::error::{BindError, EngineError};
use crate::executor::{DataStore, QueryExecutor};
use crate::fallback::FallbackOrchestrator;
use crate::matcher::{IntentMatcher, MatchOutcome, RuleMatch};
use crate::normalize;
use crate::rules::{RuleCatalog, RuleStore};

/// Reason shown to users when a matched query cannot run.
const QUERY_FAILED: &str = "查询失败，请稍后重试";

/// Per-call options.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions {
    /// Explicit row cap. `None` returns every row.
    pub limit: Option<u64>,
}

/// Everything known about one request, for audit.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub id: Uuid,
    pub query: String,
    pub entities: EntityMap,
    pub matched: Option<RuleMatch>,
    pub bound: Option<BoundQuery>,
    pub row_count: usize,
    pub fallback: bool,
    pub started: Instant,
}

impl QueryContext {
    fn new(query: &str) -> Self {
        Self {
            id: Uuid::now_v7(),
            query: query.to_string(),
            entities: EntityMap::new(),
            matched: None,
            bound: None,
            row_count: 0,
            fallback: false,
            started: Instant::now(),
        }
    }
}

/// Natural-language query front end.
pub struct QueryEngine {
    rules: Arc<RuleStore>,
    matcher: IntentMatcher,
    executor: QueryExecutor,
    fallback: Arc<FallbackOrchestrator>,
}

impl QueryEngine {
    pub fn new(
        rules: Arc<RuleStore>,
        store: Arc<dyn DataStore>,
        fallback: Arc<FallbackOrchestrator>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            rules,
            matcher: IntentMatcher::new(config.matcher.clone()),
            executor: QueryExecutor::new(store, &config.executor),
            fallback,
        }
    }

    pub fn rules(&self) -> &Arc<RuleStore> {
        &self.rules
    }

    pub fn fallback(&self) -> &Arc<FallbackOrchestrator> {
        &self.fallback
    }

    pub fn matcher(&self) -> &IntentMatcher {
        &self.matcher
    }

    /// Answer `text` with no row cap (beyond an explicitly configured one).
    pub async fn answer_query(&self, text: &str) -> QueryResponse {
        self.answer_query_with(text, QueryOptions::default()).await
    }

    pub async fn answer_query_with(&self, text: &str, options: QueryOptions) -> QueryResponse {
        self.run(text, options).await.0
    }

    /// Answer `text` and return the request's audit context alongside.
    pub async fn run(&self, text: &str, options: QueryOptions) -> (QueryResponse, QueryContext) {
        let mut ctx = QueryContext::new(text);
        let catalog = self.rules.snapshot().await;

        ctx.entities = catalog.lexicon().extract(text);
        let outcome = self
            .matcher
            .match_query(text, &ctx.entities, catalog.list_active_rules());

        let response = match outcome {
            MatchOutcome::Matched(m) => {
                ctx.matched = Some(m.clone());
                self.structured(&catalog, &m, &mut ctx, options).await
            }
            MatchOutcome::NoMatch { best_score } => {
                ctx.fallback = true;
                tracing::debug!(request_id = %ctx.id, best_score, "no intent matched, using fallback");
                QueryResponse::Conversational {
                    text: self.fallback.answer(text, &catalog).await,
                }
            }
        };

        tracing::info!(
            request_id = %ctx.id,
            intent = ctx.matched.as_ref().map(|m| m.rule.intent_name.as_str()).unwrap_or("-"),
            score = ctx.matched.as_ref().map_or(0, |m| m.score),
            entities = ctx.entities.len(),
            rows = ctx.row_count,
            fallback = ctx.fallback,
            kind = response.kind(),
            elapsed_ms = ctx.started.elapsed().as_millis() as u64,
            "query answered"
        );

        (response, ctx)
    }

    /// Entities found in `text` with the current rules.
    pub async fn extract(&self, text: &str) -> EntityMap {
        self.rules.snapshot().await.lexicon().extract(text)
    }

    async fn structured(
        &self,
        catalog: &RuleCatalog,
        m: &RuleMatch,
        ctx: &mut QueryContext,
        options: QueryOptions,
    ) -> QueryResponse {
        let rule = &m.rule;
        match self.execute(catalog, m, ctx, options).await {
            Ok(rows) => {
                ctx.row_count = rows.len();
                QueryResponse::Structured {
                    intent_name: rule.intent_name.clone(),
                    category: rule.category,
                    rows: normalize::normalize_for(rule, rows),
                }
            }
            Err(EngineError::Bind(BindError::MissingRequiredEntity(entity))) => {
                tracing::info!(request_id = %ctx.id, intent = %rule.intent_name, %entity, "required entity missing");
                QueryResponse::Error {
                    code: ErrorCode::MissingEntity,
                    reason: format!("缺少必要参数: {entity}"),
                }
            }
            Err(e) => {
                tracing::error!(
                    request_id = %ctx.id,
                    intent = %rule.intent_name,
                    rule_id = %rule.id,
                    error = %e,
                    "matched query failed"
                );
                QueryResponse::Error {
                    code: ErrorCode::QueryFailed,
                    reason: QUERY_FAILED.into(),
                }
            }
        }
    }

    async fn execute(
        &self,
        catalog: &RuleCatalog,
        m: &RuleMatch,
        ctx: &mut QueryContext,
        options: QueryOptions,
    ) -> Result<Vec<ql_protocol::Row>, EngineError> {
        let template = catalog
            .template(&m.rule.id)
            .ok_or_else(|| EngineError::MissingTemplate(m.rule.id.clone()))?;
        let bound = binder::bind(template, &ctx.entities, &m.rule.entities)?;
        let rows = self.executor.execute(&bound, options.limit).await;
        ctx.bound = Some(bound);
        Ok(rows?)
    }
}
