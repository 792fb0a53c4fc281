//! Intent matching: pick the single best rule for a query, or none.
//!
//! Scoring is additive and fully deterministic:
//! - trigger words: 2 points per character of each trigger found in the text;
//! - intent name: a bonus when the rule's name appears verbatim;
//! - category: a bonus when the query's inferred category equals the rule's;
//! - entities: a bonus per schema entity present in the extracted map.
//!
//! A rule missing any required entity is disqualified, and a rule with
//! neither a trigger nor a name hit is not a candidate at all. Ties break
//! on priority, then declaration order.

use std::sync::Arc;

use serde::Serialize;

use ql_protocol::{Category, EntityMap, IntentRule};

use crate::config::MatcherConfig;

/// Per-component score of one rule against one query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    /// Trigger words found in the query.
    pub triggers: Vec<String>,
    pub trigger_score: u32,
    pub intent_name_score: u32,
    pub category_score: u32,
    pub entity_score: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.trigger_score + self.intent_name_score + self.category_score + self.entity_score
    }
}

/// A scored candidate rule.
#[derive(Debug, Clone)]
pub struct RuleMatch {
    pub rule: Arc<IntentRule>,
    pub score: u32,
    /// `score / 100`, capped at 1.0.
    pub confidence: f64,
    pub breakdown: ScoreBreakdown,
}

/// Result of matching one query.
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    Matched(RuleMatch),
    /// Nothing reached the minimum score. `best_score` is 0 when there
    /// was no candidate at all.
    NoMatch { best_score: u32 },
}

impl MatchOutcome {
    pub fn matched(&self) -> Option<&RuleMatch> {
        match self {
            MatchOutcome::Matched(m) => Some(m),
            MatchOutcome::NoMatch { .. } => None,
        }
    }
}

/// Scores active rules against a query.
#[derive(Debug, Clone, Default)]
pub struct IntentMatcher {
    config: MatcherConfig,
}

impl IntentMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// Score one rule. `None` when the rule is not a candidate or is
    /// disqualified by a missing required entity.
    pub fn score(
        &self,
        rule: &IntentRule,
        text: &str,
        inferred: Option<Category>,
        entities: &EntityMap,
    ) -> Option<ScoreBreakdown> {
        if rule.required_entities().any(|name| !entities.contains_key(name)) {
            return None;
        }

        let lower = text.to_ascii_lowercase();
        let mut breakdown = ScoreBreakdown::default();

        for word in &rule.trigger_words {
            if word.is_empty() || breakdown.triggers.contains(word) {
                continue;
            }
            if lower.contains(&word.to_ascii_lowercase()) {
                breakdown.trigger_score += 2 * word.chars().count() as u32;
                breakdown.triggers.push(word.clone());
            }
        }

        if !rule.intent_name.is_empty() && lower.contains(&rule.intent_name.to_ascii_lowercase()) {
            breakdown.intent_name_score = self.config.intent_name_bonus;
        }

        if breakdown.trigger_score == 0 && breakdown.intent_name_score == 0 {
            return None;
        }

        if inferred == Some(rule.category) {
            breakdown.category_score = self.config.category_bonus;
        }

        // Every schema entity present counts, optional ones included.
        let found = rule
            .entities
            .keys()
            .filter(|name| entities.contains_key(name.as_str()))
            .count() as u32;
        breakdown.entity_score = found * self.config.entity_bonus;

        Some(breakdown)
    }

    /// Every candidate in selection order: score descending, then
    /// priority descending, then position in `rules`.
    ///
    /// `rules` is expected in catalog order
    /// ([`RuleCatalog::list_active_rules`](crate::rules::RuleCatalog::list_active_rules)).
    pub fn rank(&self, text: &str, entities: &EntityMap, rules: &[Arc<IntentRule>]) -> Vec<RuleMatch> {
        let inferred = infer_category(text);
        let mut candidates: Vec<(usize, RuleMatch)> = rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.is_active())
            .filter_map(|(pos, rule)| {
                let breakdown = self.score(rule, text, inferred, entities)?;
                let score = breakdown.total();
                Some((
                    pos,
                    RuleMatch {
                        rule: rule.clone(),
                        score,
                        confidence: (score as f64 / 100.0).min(1.0),
                        breakdown,
                    },
                ))
            })
            .collect();

        candidates.sort_by(|(pa, a), (pb, b)| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.rule.priority.cmp(&a.rule.priority))
                .then_with(|| pa.cmp(pb))
        });
        candidates.into_iter().map(|(_, m)| m).collect()
    }

    /// Select the best rule, or report that none qualifies.
    pub fn match_query(&self, text: &str, entities: &EntityMap, rules: &[Arc<IntentRule>]) -> MatchOutcome {
        match self.rank(text, entities, rules).into_iter().next() {
            Some(best) if best.score >= self.config.min_score => MatchOutcome::Matched(best),
            Some(best) => MatchOutcome::NoMatch {
                best_score: best.score,
            },
            None => MatchOutcome::NoMatch { best_score: 0 },
        }
    }
}

// ── Category inference ──────────────────────────────────────────

/// Guess the business category a query is about from its keywords.
pub fn infer_category(text: &str) -> Option<Category> {
    let lower = text.to_ascii_lowercase();

    if matches_any(&lower, &["对比", "比较", "vs"]) {
        return Some(Category::Comparison);
    }
    if matches_any(&lower, &["统计", "汇总", "总数", "多少次"]) {
        return Some(Category::Statistics);
    }
    if matches_any(&lower, &["上线", "生产跟踪", "不良率", "批次"]) {
        return Some(Category::ProductionTracking);
    }
    if matches_any(&lower, &["测试", "检验", "检测", "试验"]) {
        return Some(Category::Testing);
    }
    if matches_any(&lower, &["库存", "在库", "仓库", "入库"]) {
        return Some(Category::Inventory);
    }
    None
}

fn matches_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}
