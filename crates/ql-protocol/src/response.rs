use serde::{Deserialize, Serialize};

use crate::category::Category;

/// One result row: column/field name -> JSON value, insertion-ordered.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// What `answer_query` hands back to the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryResponse {
    /// A stored intent matched and its query ran.
    Structured {
        intent_name: String,
        category: Category,
        rows: Vec<Row>,
    },
    /// No intent matched; answer came from the conversational service
    /// (or its degraded stand-in).
    Conversational { text: String },
    /// A matched intent could not be answered.
    Error { code: ErrorCode, reason: String },
}

impl QueryResponse {
    pub fn kind(&self) -> &'static str {
        match self {
            QueryResponse::Structured { .. } => "structured",
            QueryResponse::Conversational { .. } => "conversational",
            QueryResponse::Error { .. } => "error",
        }
    }

    pub fn rows(&self) -> &[Row] {
        match self {
            QueryResponse::Structured { rows, .. } => rows,
            _ => &[],
        }
    }
}

/// Machine-readable reason for an `Error` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    MissingEntity,
    QueryFailed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn structured_serializes_with_kind_tag() {
        let mut row = Row::new();
        row.insert("supplier".into(), json!("聚龙"));
        let resp = QueryResponse::Structured {
            intent_name: "供应商库存查询".into(),
            category: Category::Inventory,
            rows: vec![row],
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["kind"], "structured");
        assert_eq!(value["intent_name"], "供应商库存查询");
        assert_eq!(value["category"], "inventory");
        assert_eq!(value["rows"][0]["supplier"], "聚龙");
    }

    #[test]
    fn error_serializes_code() {
        let resp = QueryResponse::Error {
            code: ErrorCode::MissingEntity,
            reason: "缺少必要参数: supplier".into(),
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["kind"], "error");
        assert_eq!(value["code"], "missing_entity");
        assert!(resp.rows().is_empty());
    }

    #[test]
    fn conversational_roundtrip() {
        let resp = QueryResponse::Conversational {
            text: "你好".into(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        let back: QueryResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, resp);
        assert_eq!(back.kind(), "conversational");
    }
}
