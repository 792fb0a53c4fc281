//! Load-time rule validation. A rule that fails here is never served.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use ql_protocol::IntentRule;

use super::template::Template;
use crate::error::RuleError;

static WRITE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(insert|update|delete|merge|drop|alter|truncate|create|grant|revoke|copy|call)\b")
        .unwrap()
});

static ROW_CAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\blimit\b|\bfetch\s+(first|next)\b|\btop\s*\(?\s*\d").unwrap());

/// Check one rule in isolation and return its parsed template.
///
/// Cross-rule checks (duplicate ids and names) live in
/// [`RuleCatalog::build`](super::RuleCatalog::build).
pub fn validate_rule(rule: &IntentRule) -> Result<Template, RuleError> {
    let template = Template::parse(&rule.query_template)?;
    check_statement(&template)?;

    for (name, in_section) in template.placeholders() {
        let def = rule
            .entities
            .get(name)
            .ok_or_else(|| RuleError::UnknownPlaceholder(name.to_string()))?;
        if !in_section && !def.required && def.default.is_none() {
            return Err(RuleError::UnboundPlaceholder(name.to_string()));
        }
    }

    let mut seen = HashSet::new();
    for d in &rule.display_fields {
        if !seen.insert(d.field.as_str()) {
            return Err(RuleError::DuplicateDisplayField(d.field.clone()));
        }
    }
    if let Some(canonical) = rule.category.canonical_fields() {
        if let Some(missing) = canonical.iter().find(|f| !seen.contains(f.name)) {
            return Err(RuleError::MissingDisplayField(missing.name.to_string()));
        }
    } else if rule.display_fields.is_empty() {
        return Err(RuleError::MissingDisplayField("*".into()));
    }

    for (entity, def) in &rule.entities {
        if let Some(pattern) = &def.pattern {
            Regex::new(pattern).map_err(|e| RuleError::InvalidPattern {
                entity: entity.clone(),
                message: e.to_string(),
            })?;
        }
    }

    Ok(template)
}

/// Single read-only statement, no embedded row cap.
fn check_statement(template: &Template) -> Result<(), RuleError> {
    let shape = template.shape().trim();
    let body = shape.trim_end_matches(';').trim_end();

    if !(body.starts_with("select") || body.starts_with("with")) || body.contains(';') {
        return Err(RuleError::NotReadOnly);
    }
    if WRITE_KEYWORD.is_match(body) {
        return Err(RuleError::NotReadOnly);
    }
    if ROW_CAP.is_match(body) {
        return Err(RuleError::HiddenLimit);
    }
    Ok(())
}
