//! Result normalization: raw rows in, canonical rows out.
//!
//! For categories with a canonical field set every output row carries
//! exactly that set, in canonical order. Other categories emit the rule's
//! display fields in declared order. A field whose source column is absent,
//! null or blank gets its default.

use serde_json::Value;

use ql_protocol::{CanonicalField, DisplayField, FieldDefault, IntentRule, Row};

/// Normalize `rows` for `rule`'s category and display mapping.
pub fn normalize_for(rule: &IntentRule, rows: Vec<Row>) -> Vec<Row> {
    normalize(rows, &rule.display_fields, rule.category.canonical_fields())
}

pub fn normalize(rows: Vec<Row>, display_fields: &[DisplayField], canonical: Option<&[CanonicalField]>) -> Vec<Row> {
    let layout: Vec<(&str, Option<&str>, FieldDefault)> = match canonical {
        Some(fields) => fields
            .iter()
            .map(|f| {
                let column = display_fields
                    .iter()
                    .find(|d| d.field == f.name)
                    .map(|d| d.column.as_str());
                (f.name, column, f.default)
            })
            .collect(),
        None => display_fields
            .iter()
            .map(|d| (d.field.as_str(), Some(d.column.as_str()), FieldDefault::Empty))
            .collect(),
    };

    rows.into_iter()
        .map(|raw| {
            let mut out = Row::new();
            for (field, column, default) in &layout {
                let value = column
                    .and_then(|c| raw.get(c).cloned())
                    .filter(|v| !is_blank(v))
                    .unwrap_or_else(|| default.to_value());
                out.insert((*field).to_string(), value);
            }
            out
        })
        .collect()
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
