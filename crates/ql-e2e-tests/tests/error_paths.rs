//! E2E tests for error paths and edge cases across crate boundaries.

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use helpers::TestHarness;
use ql_engine::MockDataStore;

/// A failing data store yields a generic error; raw store text never leaks.
#[tokio::test]
async fn e2e_store_failure_is_generic() {
    let h = TestHarness::with_store(MockDataStore::failing(
        "relation \"inventory\" does not exist at 10.0.0.5:5432",
    ));

    let (status, json) = h.query("查询聚龙供应商的库存").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["kind"], "error");
    assert_eq!(json["code"], "query_failed");
    let reason = json["reason"].as_str().unwrap();
    assert!(!reason.contains("relation"));
    assert!(!reason.contains("10.0.0.5"));
}

/// An empty question is rejected before reaching the engine.
#[tokio::test]
async fn e2e_empty_query_rejected() {
    let h = TestHarness::with_sample_data();

    let (status, json) = h.query("").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
    assert!(h.store.executed().is_empty());
}

/// An empty extract request is rejected too.
#[tokio::test]
async fn e2e_empty_extract_rejected() {
    let h = TestHarness::with_sample_data();

    let (status, _) = h.post("/api/v1/extract", json!({ "query": "  " })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// A body without `query` is refused by the JSON extractor.
#[tokio::test]
async fn e2e_malformed_body_rejected() {
    let h = TestHarness::with_sample_data();

    let response = h
        .router
        .clone()
        .oneshot(
            Request::post("/api/v1/query")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"question": "库存"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

/// Unknown routes are 404.
#[tokio::test]
async fn e2e_unknown_route() {
    let h = TestHarness::with_sample_data();

    let response = h
        .router
        .clone()
        .oneshot(Request::get("/api/v1/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// A required entity the question lacks routes to a rule that needs none.
#[tokio::test]
async fn e2e_missing_required_entity_falls_to_overview() {
    let h = TestHarness::with_sample_data();

    let (_, json) = h.query("供应商的库存").await;

    assert_eq!(json["kind"], "structured");
    assert_eq!(json["intent_name"], "库存总览");
    let (query, _) = &h.store.executed()[0];
    assert!(query.params.is_empty());
}

/// Extraction diagnostics show dates and pattern entities.
#[tokio::test]
async fn e2e_extract_diagnostics() {
    let h = TestHarness::with_sample_data();

    let (status, json) = h
        .post("/api/v1/extract", json!({ "query": "批次105112在2024-06-01的上线情况" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["batch"], "105112");
    assert_eq!(json["date_from"], "2024-06-01");
    assert_eq!(json["date_to"], "2024-06-01");
}
