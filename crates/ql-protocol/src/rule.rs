use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Entity values extracted from one query, keyed by entity name
/// (`supplier`, `material`, `factory`, `status`, `batch`, `date_from`, ...).
pub type EntityMap = BTreeMap<String, String>;

/// Whether a rule is served at request time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    #[default]
    Active,
    Inactive,
}

/// A named, versionable query capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentRule {
    /// Unique rule identifier.
    pub id: String,
    /// Human-readable name, unique among active rules.
    pub intent_name: String,
    pub category: Category,
    /// Keywords whose presence in a query raises this rule's score.
    #[serde(default)]
    pub trigger_words: Vec<String>,
    /// Entity name -> extraction definition.
    #[serde(default)]
    pub entities: BTreeMap<String, EntityDef>,
    /// Parameterized SQL with `:name` placeholders and `[[ ... ]]` optional sections.
    pub query_template: String,
    /// Higher wins ties.
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub status: RuleStatus,
    /// Ordered canonical field -> template column alias pairs.
    #[serde(default)]
    pub display_fields: Vec<DisplayField>,
}

impl IntentRule {
    pub fn is_active(&self) -> bool {
        self.status == RuleStatus::Active
    }

    /// Entity names this rule cannot run without, in name order.
    pub fn required_entities(&self) -> impl Iterator<Item = &str> {
        self.entities
            .iter()
            .filter(|(_, def)| def.required)
            .map(|(name, _)| name.as_str())
    }

    /// Source column for a canonical field, if the rule maps it.
    pub fn display_column(&self, field: &str) -> Option<&str> {
        self.display_fields
            .iter()
            .find(|d| d.field == field)
            .map(|d| d.column.as_str())
    }
}

/// How one entity is recognized in query text and bound into the template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityDef {
    /// Known literal values (e.g. supplier names).
    #[serde(default)]
    pub values: Vec<String>,
    /// Raw keyword -> canonical value (e.g. "深圳" -> "深圳工厂").
    /// Keys are recognized in text just like `values`.
    #[serde(default)]
    pub normalize: BTreeMap<String, String>,
    /// Regex used when no literal matches (e.g. six-digit batch codes).
    #[serde(default)]
    pub pattern: Option<String>,
    /// A rule whose required entity is missing is never selected.
    #[serde(default)]
    pub required: bool,
    /// Value bound when the entity is absent from the query.
    #[serde(default)]
    pub default: Option<String>,
}

impl EntityDef {
    /// Every literal that identifies this entity in text, paired with the
    /// value it resolves to.
    pub fn literals(&self) -> impl Iterator<Item = (&str, &str)> {
        let plain = self.values.iter().map(|v| {
            let canonical = self.normalize.get(v).unwrap_or(v);
            (v.as_str(), canonical.as_str())
        });
        let aliases = self
            .normalize
            .iter()
            .map(|(raw, canonical)| (raw.as_str(), canonical.as_str()));
        plain.chain(aliases)
    }
}

/// One (canonical field -> source column) mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayField {
    pub field: String,
    pub column: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULE_TOML: &str = r#"
id = "inv-supplier"
intent_name = "供应商库存查询"
category = "inventory"
trigger_words = ["库存", "供应商"]
priority = 10
query_template = "SELECT * FROM inventory WHERE supplier_name = :supplier"
display_fields = [
    { field = "supplier", column = "supplier_name" },
]

[entities.supplier]
values = ["聚龙", "BOE"]
required = true

[entities.factory]
values = ["重庆工厂"]
normalize = { "深圳" = "深圳工厂" }
"#;

    #[test]
    fn deserialize_rule_from_toml() {
        let rule: IntentRule = toml::from_str(RULE_TOML).unwrap();
        assert_eq!(rule.id, "inv-supplier");
        assert_eq!(rule.category, Category::Inventory);
        assert_eq!(rule.status, RuleStatus::Active);
        assert_eq!(rule.priority, 10);
        assert_eq!(rule.required_entities().collect::<Vec<_>>(), vec!["supplier"]);
        assert_eq!(rule.display_column("supplier"), Some("supplier_name"));
        assert_eq!(rule.display_column("factory"), None);
    }

    #[test]
    fn literals_include_normalize_keys() {
        let rule: IntentRule = toml::from_str(RULE_TOML).unwrap();
        let factory = &rule.entities["factory"];
        let lits: Vec<_> = factory.literals().collect();
        assert!(lits.contains(&("重庆工厂", "重庆工厂")));
        assert!(lits.contains(&("深圳", "深圳工厂")));
    }

    #[test]
    fn inactive_status_roundtrip() {
        let json = serde_json::to_string(&RuleStatus::Inactive).unwrap();
        assert_eq!(json, r#""inactive""#);
    }
}
