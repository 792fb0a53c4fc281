//! Shared test harness for E2E integration tests.
//!
//! Builds the real `ql-api` router over a `MockDataStore` and a chosen
//! fallback, so requests exercise every crate boundary.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use ql_api::routes::build_router;
use ql_api::sample;
use ql_api::state::AppState;
use ql_engine::rules::source::{SAMPLE_RULES, parse_rules_toml};
use ql_engine::rules::{RuleCatalog, RuleSource, RuleStore, StaticRuleSource};
use ql_engine::{EngineConfig, FallbackOrchestrator, MockDataStore, QueryEngine};

/// End-to-end harness: router plus handles on its collaborators.
pub struct TestHarness {
    pub state: AppState,
    pub router: Router,
    /// The data store behind the engine, for asserting what ran.
    pub store: Arc<MockDataStore>,
}

impl TestHarness {
    /// Bundled rules over the sample rows, fallback disabled.
    pub fn with_sample_data() -> Self {
        Self::sample_with(FallbackOrchestrator::disabled(), sample::sample_store())
    }

    /// Bundled rules over the sample rows with the given fallback.
    pub fn with_fallback(fallback: FallbackOrchestrator) -> Self {
        Self::sample_with(fallback, sample::sample_store())
    }

    /// Bundled rules over a custom store.
    pub fn with_store(store: MockDataStore) -> Self {
        Self::sample_with(FallbackOrchestrator::disabled(), store)
    }

    /// Rules loaded from `source` (and reloaded from it), sample rows.
    pub async fn with_source(source: Arc<dyn RuleSource>) -> Self {
        let rules = RuleStore::load(source.as_ref()).await.unwrap();
        Self::assemble(
            rules,
            source,
            sample::sample_store(),
            FallbackOrchestrator::disabled(),
        )
    }

    fn sample_with(fallback: FallbackOrchestrator, store: MockDataStore) -> Self {
        let rules = RuleStore::new(RuleCatalog::build(parse_rules_toml(SAMPLE_RULES).unwrap()));
        let source = Arc::new(StaticRuleSource::sample().unwrap());
        Self::assemble(rules, source, store, fallback)
    }

    fn assemble(
        rules: RuleStore,
        source: Arc<dyn RuleSource>,
        store: MockDataStore,
        fallback: FallbackOrchestrator,
    ) -> Self {
        let store = Arc::new(store);
        let engine = QueryEngine::new(
            Arc::new(rules),
            store.clone(),
            Arc::new(fallback),
            &EngineConfig::default(),
        );
        let state = AppState::new(Arc::new(engine), source);
        let router = build_router(state.clone());
        Self {
            state,
            router,
            store,
        }
    }

    /// POST /api/v1/query with no row cap.
    pub async fn query(&self, text: &str) -> (StatusCode, serde_json::Value) {
        self.post("/api/v1/query", serde_json::json!({ "query": text }))
            .await
    }

    /// POST /api/v1/query with an explicit row cap.
    pub async fn query_with_limit(&self, text: &str, limit: u64) -> (StatusCode, serde_json::Value) {
        self.post("/api/v1/query", serde_json::json!({ "query": text, "limit": limit }))
            .await
    }

    /// POST a JSON body. Returns (HTTP status code, response JSON body).
    pub async fn post(&self, path: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::post(path)
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (status, json)
    }

    /// GET a path. Returns (HTTP status code, response JSON body).
    pub async fn get(&self, path: &str) -> (StatusCode, serde_json::Value) {
        let response = self
            .router
            .clone()
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (status, json)
    }

    /// POST /api/v1/rules/reload.
    pub async fn reload(&self) -> (StatusCode, serde_json::Value) {
        let response = self
            .router
            .clone()
            .oneshot(Request::post("/api/v1/rules/reload").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (status, json)
    }
}
