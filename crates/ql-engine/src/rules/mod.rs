//! Rule store: the validated, versioned set of intent rules.
//!
//! A [`RuleCatalog`] is an immutable snapshot. [`RuleStore`] holds the
//! current snapshot and swaps it whole on reload, so an in-flight request
//! never sees a half-loaded rule set.

pub mod refresh;
pub mod source;
pub mod template;
pub mod validate;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use ql_protocol::IntentRule;

use crate::error::RuleError;
use crate::extract::Lexicon;
use template::Template;

pub use source::{PgRuleSource, RuleSource, StaticRuleSource, TomlRuleSource};

/// A rule refused at load time.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedRule {
    pub id: String,
    pub reason: String,
}

/// Counts reported after a (re)load.
#[derive(Debug, Clone, Serialize)]
pub struct ReloadSummary {
    pub source: String,
    pub loaded: usize,
    pub active: usize,
    pub rejected: Vec<RejectedRule>,
}

/// Immutable, validated rule set.
#[derive(Debug)]
pub struct RuleCatalog {
    /// Accepted rules in declaration order.
    rules: Vec<Arc<IntentRule>>,
    /// Accepted active rules, priority descending, then declaration order.
    active: Vec<Arc<IntentRule>>,
    templates: HashMap<String, Arc<Template>>,
    rejected: Vec<RejectedRule>,
    lexicon: Lexicon,
    loaded_at: DateTime<Utc>,
}

impl RuleCatalog {
    /// Validate `rules` and build a catalog from the ones that pass.
    /// Invalid rules are logged and listed in [`rejected`](Self::rejected);
    /// they never stop the rest from loading.
    pub fn build(rules: Vec<IntentRule>) -> Self {
        let mut accepted: Vec<Arc<IntentRule>> = Vec::new();
        let mut templates = HashMap::new();
        let mut rejected = Vec::new();
        let mut ids = HashSet::new();
        let mut names = HashSet::new();

        for rule in rules {
            let result = if ids.contains(&rule.id) {
                Err(RuleError::DuplicateId(rule.id.clone()))
            } else if rule.is_active() && names.contains(&rule.intent_name) {
                Err(RuleError::DuplicateIntentName(rule.intent_name.clone()))
            } else {
                validate::validate_rule(&rule)
            };

            match result {
                Ok(template) => {
                    ids.insert(rule.id.clone());
                    if rule.is_active() {
                        names.insert(rule.intent_name.clone());
                    }
                    templates.insert(rule.id.clone(), Arc::new(template));
                    accepted.push(Arc::new(rule));
                }
                Err(e) => {
                    tracing::warn!(rule_id = %rule.id, intent = %rule.intent_name, error = %e, "rejected intent rule");
                    rejected.push(RejectedRule {
                        id: rule.id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut active: Vec<Arc<IntentRule>> =
            accepted.iter().filter(|r| r.is_active()).cloned().collect();
        // Stable: equal priorities keep declaration order.
        active.sort_by(|a, b| b.priority.cmp(&a.priority));

        let lexicon = Lexicon::build(accepted.iter().filter(|r| r.is_active()).map(|r| r.as_ref()));

        Self {
            rules: accepted,
            active,
            templates,
            rejected,
            lexicon,
            loaded_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::build(Vec::new())
    }

    /// Active rules, priority descending then declaration order.
    pub fn list_active_rules(&self) -> &[Arc<IntentRule>] {
        &self.active
    }

    /// Every accepted rule, active or not, in declaration order.
    pub fn all_rules(&self) -> &[Arc<IntentRule>] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&Arc<IntentRule>> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Parsed template of an accepted rule.
    pub fn template(&self, id: &str) -> Option<&Arc<Template>> {
        self.templates.get(id)
    }

    pub fn rejected(&self) -> &[RejectedRule] {
        &self.rejected
    }

    /// Known entity values pooled from the active rules.
    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn summary(&self, source: impl Into<String>) -> ReloadSummary {
        ReloadSummary {
            source: source.into(),
            loaded: self.rules.len(),
            active: self.active.len(),
            rejected: self.rejected.clone(),
        }
    }
}

/// Holds the current [`RuleCatalog`] and replaces it atomically.
pub struct RuleStore {
    current: RwLock<Arc<RuleCatalog>>,
}

impl RuleStore {
    pub fn new(catalog: RuleCatalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    /// Load rules from `source` into a new store.
    pub async fn load(source: &dyn RuleSource) -> Result<Self, RuleError> {
        let rules = source.load().await?;
        let catalog = RuleCatalog::build(rules);
        tracing::info!(
            source = %source.describe(),
            active = catalog.list_active_rules().len(),
            rejected = catalog.rejected().len(),
            "intent rules loaded"
        );
        Ok(Self::new(catalog))
    }

    /// The catalog as of now. Holders keep a consistent view even if a
    /// reload lands mid-request.
    pub async fn snapshot(&self) -> Arc<RuleCatalog> {
        self.current.read().await.clone()
    }

    /// Swap in a new catalog, returning the previous one.
    pub async fn replace(&self, catalog: RuleCatalog) -> Arc<RuleCatalog> {
        let mut current = self.current.write().await;
        std::mem::replace(&mut *current, Arc::new(catalog))
    }

    /// Re-read `source` and swap in the result. On a source error the
    /// current catalog stays in place.
    pub async fn reload(&self, source: &dyn RuleSource) -> Result<ReloadSummary, RuleError> {
        let rules = source.load().await?;
        let catalog = RuleCatalog::build(rules);
        let summary = catalog.summary(source.describe());
        self.replace(catalog).await;
        tracing::info!(
            source = %summary.source,
            loaded = summary.loaded,
            active = summary.active,
            rejected = summary.rejected.len(),
            "intent rules reloaded"
        );
        Ok(summary)
    }
}
