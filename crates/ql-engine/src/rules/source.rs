//! Where intent rules are read from.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use sqlx::PgPool;

use ql_protocol::{Category, DisplayField, EntityDef, IntentRule, RuleStatus};

use crate::error::RuleError;

/// The bundled demo rule set.
pub const SAMPLE_RULES: &str = include_str!("../../rules/sample.toml");

/// A backing store for rule definitions.
#[async_trait]
pub trait RuleSource: Send + Sync {
    /// Read every rule definition, in declaration order. Validation happens
    /// later; a source only fails when it cannot be read at all.
    async fn load(&self) -> Result<Vec<IntentRule>, RuleError>;

    /// Short label for logs and reload summaries.
    fn describe(&self) -> String;
}

#[derive(Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<IntentRule>,
}

/// Parse a `[[rules]]` TOML document.
pub fn parse_rules_toml(contents: &str) -> Result<Vec<IntentRule>, RuleError> {
    let file: RuleFile = toml::from_str(contents).map_err(|e| RuleError::Source(e.to_string()))?;
    Ok(file.rules)
}

/// Rules from a TOML file, re-read on every load.
pub struct TomlRuleSource {
    path: PathBuf,
}

impl TomlRuleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RuleSource for TomlRuleSource {
    async fn load(&self) -> Result<Vec<IntentRule>, RuleError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| RuleError::Source(format!("{}: {e}", self.path.display())))?;
        parse_rules_toml(&contents)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// A fixed, in-memory rule list.
pub struct StaticRuleSource {
    label: String,
    rules: Vec<IntentRule>,
}

impl StaticRuleSource {
    pub fn new(rules: Vec<IntentRule>) -> Self {
        Self {
            label: "static".into(),
            rules,
        }
    }

    /// The bundled demo rules.
    pub fn sample() -> Result<Self, RuleError> {
        Ok(Self {
            label: "sample".into(),
            rules: parse_rules_toml(SAMPLE_RULES)?,
        })
    }
}

#[async_trait]
impl RuleSource for StaticRuleSource {
    async fn load(&self) -> Result<Vec<IntentRule>, RuleError> {
        Ok(self.rules.clone())
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

/// `intent_rules` row. List-valued columns are JSONB.
#[derive(Debug, Clone, sqlx::FromRow)]
struct IntentRuleRow {
    id: String,
    intent_name: String,
    category: String,
    trigger_words: serde_json::Value,
    entities: serde_json::Value,
    query_template: String,
    priority: i32,
    status: String,
    display_fields: serde_json::Value,
}

impl IntentRuleRow {
    fn into_rule(self) -> Result<IntentRule, String> {
        let category: Category = self.category.parse().map_err(|e| format!("{e}"))?;
        let status = match self.status.as_str() {
            "active" => RuleStatus::Active,
            "inactive" => RuleStatus::Inactive,
            other => return Err(format!("unknown status '{other}'")),
        };
        let trigger_words: Vec<String> =
            serde_json::from_value(self.trigger_words).map_err(|e| format!("trigger_words: {e}"))?;
        let entities: std::collections::BTreeMap<String, EntityDef> =
            serde_json::from_value(self.entities).map_err(|e| format!("entities: {e}"))?;
        let display_fields: Vec<DisplayField> =
            serde_json::from_value(self.display_fields).map_err(|e| format!("display_fields: {e}"))?;

        Ok(IntentRule {
            id: self.id,
            intent_name: self.intent_name,
            category,
            trigger_words,
            entities,
            query_template: self.query_template,
            priority: self.priority,
            status,
            display_fields,
        })
    }
}

/// Rules stored in the `intent_rules` table.
pub struct PgRuleSource {
    pool: PgPool,
}

impl PgRuleSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RuleSource for PgRuleSource {
    async fn load(&self) -> Result<Vec<IntentRule>, RuleError> {
        let rows = sqlx::query_as::<_, IntentRuleRow>(
            "SELECT id, intent_name, category, trigger_words, entity_schema AS entities, query_template,
                    priority, status, display_fields
             FROM intent_rules ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RuleError::Source(e.to_string()))?;

        let mut rules = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id.clone();
            match row.into_rule() {
                Ok(rule) => rules.push(rule),
                Err(reason) => {
                    tracing::warn!(rule_id = %id, %reason, "skipping malformed intent_rules row");
                }
            }
        }
        Ok(rules)
    }

    fn describe(&self) -> String {
        "postgres:intent_rules".into()
    }
}
