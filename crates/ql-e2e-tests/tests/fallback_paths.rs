//! E2E tests for the conversational path: unmatched questions go to the
//! chat backend (a wiremock server speaking the OpenAI completion API),
//! and degrade to a fixed message when it is down.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::TestHarness;
use ql_engine::config::FallbackConfig;
use ql_engine::{ChatError, FallbackOrchestrator, HttpChatClient, MockChatClient, RetryPolicy};

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(10),
        multiplier: 2.0,
    }
}

fn http_fallback(server: &MockServer) -> FallbackOrchestrator {
    let config = FallbackConfig {
        enabled: true,
        base_url: format!("{}/v1", server.uri()),
        model: "deepseek-chat".into(),
        call_timeout_secs: 5,
        ..Default::default()
    };
    let client = HttpChatClient::new(&config, Some("sk-test".into())).unwrap();
    FallbackOrchestrator::new(Arc::new(client), &config).with_retry(fast_retry())
}

async fn completions_received(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/v1/chat/completions")
        .count()
}

/// A general question is answered by the chat backend, and the store is never touched.
#[tokio::test]
async fn e2e_general_question_answered_by_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "来料检验（IQC）是对供应商来料的质量检查。" },
                "finish_reason": "stop"
            }]
        })))
        .mount(&server)
        .await;

    let h = TestHarness::with_fallback(http_fallback(&server));
    let (status, json) = h.query("什么是IQC？").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["kind"], "conversational");
    assert!(json["text"].as_str().unwrap().contains("来料检验"));
    assert!(h.store.executed().is_empty());

    // The system prompt lists the known entity categories.
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["messages"][0]["role"], "system");
    assert!(body["messages"][0]["content"].as_str().unwrap().contains("supplier"));
    assert_eq!(body["messages"][1]["content"], "什么是IQC？");
}

/// Retryable failures are retried, then the degraded message is served.
/// Later questions skip the backend until its health is re-checked.
#[tokio::test]
async fn e2e_backend_down_degrades() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let h = TestHarness::with_fallback(http_fallback(&server));

    let (status, json) = h.query("今天天气怎么样").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["kind"], "conversational");
    let text = json["text"].as_str().unwrap();
    assert!(text.contains("「今天天气怎么样」"));
    assert_eq!(completions_received(&server).await, 3);

    let (_, json) = h.query("讲个笑话").await;
    assert!(json["text"].as_str().unwrap().contains("「讲个笑话」"));
    assert_eq!(completions_received(&server).await, 3);
}

/// Structured questions still work while the chat backend is down.
#[tokio::test]
async fn e2e_structured_path_independent_of_chat() {
    let chat = Arc::new(MockChatClient::failing(ChatError::Unavailable("down".into())));
    let config = FallbackConfig {
        enabled: true,
        ..Default::default()
    };
    let h = TestHarness::with_fallback(FallbackOrchestrator::new(chat.clone(), &config));

    let (_, json) = h.query("查询聚龙供应商的库存").await;

    assert_eq!(json["kind"], "structured");
    assert!(chat.calls().is_empty());
}

/// Without a configured backend the degraded message suggests sample questions.
#[tokio::test]
async fn e2e_disabled_fallback_suggests_intents() {
    let h = TestHarness::with_sample_data();

    let (_, json) = h.query("你是谁").await;

    assert_eq!(json["kind"], "conversational");
    let text = json["text"].as_str().unwrap();
    assert!(text.contains("「你是谁」"));
    assert!(text.contains("供应商库存查询"));
}
