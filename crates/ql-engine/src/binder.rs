//! Template binding: turn a rule template plus an entity map into a
//! parameterized statement.
//!
//! Entity values only ever travel as positional parameters (`$1`, `$2`,
//! ...). The SQL text is assembled from template text alone.

use std::collections::BTreeMap;

use ql_protocol::{EntityDef, EntityMap, IntentRule};

use crate::error::BindError;
use crate::rules::template::{Segment, Template};

/// One positional parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundParam {
    /// Entity the value came from.
    pub name: String,
    pub value: String,
}

/// A statement ready to execute: `$n` in `sql` is `params[n - 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundQuery {
    pub sql: String,
    pub params: Vec<BoundParam>,
}

impl BoundQuery {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}

/// Bind a rule's template. Parses the template on every call; use
/// [`bind`] with the catalog's parsed template on the request path.
pub fn bind_rule(rule: &IntentRule, entities: &EntityMap) -> Result<BoundQuery, BindError> {
    let template = Template::parse(&rule.query_template)?;
    bind(&template, entities, &rule.entities)
}

/// Bind `template` against `entities`.
///
/// Fails closed: a required entity absent from `entities` is always
/// [`BindError::MissingRequiredEntity`], wherever it appears. Optional
/// entities fall back to their schema default; an optional section with
/// any unresolved placeholder is left out entirely.
pub fn bind(
    template: &Template,
    entities: &EntityMap,
    schema: &BTreeMap<String, EntityDef>,
) -> Result<BoundQuery, BindError> {
    if let Some((name, _)) = schema
        .iter()
        .find(|(name, def)| def.required && !has_value(entities, name))
    {
        return Err(BindError::MissingRequiredEntity(name.clone()));
    }

    let resolve = |name: &str| -> Option<String> {
        entities
            .get(name)
            .filter(|v| !v.is_empty())
            .cloned()
            .or_else(|| schema.get(name).and_then(|def| def.default.clone()))
    };

    let mut sql = String::new();
    let mut params: Vec<BoundParam> = Vec::new();

    for segment in template.segments() {
        match segment {
            Segment::Text(text) => sql.push_str(text),
            Segment::Param(name) => {
                let value = resolve(name).ok_or_else(|| BindError::MissingRequiredEntity(name.clone()))?;
                push_param(&mut sql, &mut params, name, value);
            }
            Segment::Section(inner) => {
                let complete = inner.iter().all(|s| match s {
                    Segment::Param(name) => resolve(name).is_some(),
                    _ => true,
                });
                if !complete {
                    continue;
                }
                for s in inner {
                    match s {
                        Segment::Text(text) => sql.push_str(text),
                        Segment::Param(name) => {
                            if let Some(value) = resolve(name) {
                                push_param(&mut sql, &mut params, name, value);
                            }
                        }
                        // Sections never nest.
                        Segment::Section(_) => {}
                    }
                }
            }
        }
    }

    let sql = sql.trim_end().trim_end_matches(';').trim().to_string();
    Ok(BoundQuery { sql, params })
}

fn has_value(entities: &EntityMap, name: &str) -> bool {
    entities.get(name).is_some_and(|v| !v.is_empty())
}

/// Append `$n` for `name`, reusing the index when the same entity
/// appears more than once.
fn push_param(sql: &mut String, params: &mut Vec<BoundParam>, name: &str, value: String) {
    let index = match params.iter().position(|p| p.name == name) {
        Some(i) => i + 1,
        None => {
            params.push(BoundParam {
                name: name.to_string(),
                value,
            });
            params.len()
        }
    };
    sql.push('$');
    sql.push_str(&index.to_string());
}
