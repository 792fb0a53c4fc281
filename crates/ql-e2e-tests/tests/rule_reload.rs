//! E2E tests for rule catalog listing and hot reload from a TOML file.

mod helpers;

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::StatusCode;
use uuid::Uuid;

use helpers::TestHarness;
use ql_engine::TomlRuleSource;

const BATCH_COUNT_RULE: &str = r#"
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

const DEFECT_SUMMARY_RULE: &str = r#"
[[rules]]
id = "factory-defect-summary"
intent_name = "工厂不良汇总"
category = "statistics"
trigger_words = ["不良汇总"]
priority = 3
query_template = """
SELECT factory_name, avg(defect_rate) AS avg_rate
FROM production_tracking
[[WHERE factory_name = :factory]]
GROUP BY factory_name
"""
display_fields = [
    { field = "factory", column = "factory_name" },
    { field = "avgRate", column = "avg_rate" },
]

[rules.entities.factory]
values = ["重庆工厂", "深圳工厂"]
"#;

const WRITE_RULE: &str = r#"
[[rules]]
id = "purge-inventory"
intent_name = "清空库存"
category = "inventory"
trigger_words = ["清空"]
query_template = "DELETE FROM inventory"
"#;

struct RuleFile(PathBuf);

impl RuleFile {
    fn new(contents: &str) -> Self {
        let path = std::env::temp_dir().join(format!("ql-e2e-rules-{}.toml", Uuid::now_v7()));
        std::fs::write(&path, contents).unwrap();
        Self(path)
    }

    fn write(&self, contents: &str) {
        std::fs::write(&self.0, contents).unwrap();
    }
}

impl Drop for RuleFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

async fn harness(file: &RuleFile) -> TestHarness {
    TestHarness::with_source(Arc::new(TomlRuleSource::new(&file.0))).await
}

/// Rules from a file are listed and answered.
#[tokio::test]
async fn e2e_rules_from_file() {
    let file = RuleFile::new(BATCH_COUNT_RULE);
    let h = harness(&file).await;

    let (status, json) = h.get("/api/v1/rules").await;
    assert_eq!(status, StatusCode::OK);
    let rules = json.as_array().unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0]["id"], "supplier-batch-count");
    assert_eq!(rules[0]["category"], "statistics");

    let (_, json) = h.query("聚龙批次统计").await;
    assert_eq!(json["kind"], "structured");
    assert_eq!(json["intent_name"], "供应商批次统计");
    let keys: Vec<&String> = json["rows"][0].as_object().unwrap().keys().collect();
    assert_eq!(keys, ["supplier", "batches"]);
}

/// A reload picks up new rules; the next question sees them.
#[tokio::test]
async fn e2e_reload_adds_rule() {
    let file = RuleFile::new(BATCH_COUNT_RULE);
    let h = harness(&file).await;

    let (_, json) = h.query("重庆工厂不良汇总").await;
    assert_eq!(json["kind"], "conversational");

    file.write(&format!("{BATCH_COUNT_RULE}\n{DEFECT_SUMMARY_RULE}"));
    let (status, json) = h.reload().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["loaded"], 2);
    assert_eq!(json["active"], 2);
    assert!(json["source"].as_str().unwrap().starts_with("file:"));

    let (_, json) = h.query("重庆工厂不良汇总").await;
    assert_eq!(json["kind"], "structured");
    assert_eq!(json["intent_name"], "工厂不良汇总");

    // Higher priority lists first.
    let (_, json) = h.get("/api/v1/rules").await;
    assert_eq!(json[0]["id"], "factory-defect-summary");

    let (_, json) = h.get("/health").await;
    assert_eq!(json["rules"], 2);
}

/// An unreadable file fails the reload and leaves the current rules in place.
#[tokio::test]
async fn e2e_broken_reload_keeps_rules() {
    let file = RuleFile::new(BATCH_COUNT_RULE);
    let h = harness(&file).await;

    file.write("[[rules]\nid = ");
    let (status, json) = h.reload().await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["status"], 500);

    let (_, json) = h.query("聚龙批次统计").await;
    assert_eq!(json["intent_name"], "供应商批次统计");
}

/// An invalid rule is rejected with a reason; the valid ones still load.
#[tokio::test]
async fn e2e_invalid_rule_rejected_on_reload() {
    let file = RuleFile::new(BATCH_COUNT_RULE);
    let h = harness(&file).await;

    file.write(&format!("{BATCH_COUNT_RULE}\n{WRITE_RULE}"));
    let (status, json) = h.reload().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["loaded"], 1);
    assert_eq!(json["active"], 1);
    assert_eq!(json["rejected"][0]["id"], "purge-inventory");

    let (_, json) = h.query("清空库存").await;
    assert_eq!(json["kind"], "conversational");
    assert!(h.store.executed().is_empty());
}
