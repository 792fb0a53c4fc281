//! PostgreSQL-backed [`DataStore`].

use async_trait::async_trait;
use sqlx::PgPool;

use ql_protocol::Row;

use super::DataStore;
use crate::binder::BoundQuery;
use crate::error::{StoreError, StoreResult};

/// Runs bound statements on a Postgres pool.
///
/// Each row comes back as one JSON object (`row_to_json`), so column order
/// and JSON-native types survive without per-column decoding.
pub struct PgDataStore {
    pool: PgPool,
}

impl PgDataStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Wrap `query` so each row is one JSON value, appending a `LIMIT`
/// parameter only when the caller asked for one.
fn wrap(query: &BoundQuery, limit: Option<u64>) -> String {
    let mut sql = format!("SELECT row_to_json(t) FROM ({}) AS t", query.sql);
    if limit.is_some() {
        sql.push_str(&format!(" LIMIT ${}", query.params.len() + 1));
    }
    sql
}

#[async_trait]
impl DataStore for PgDataStore {
    async fn fetch_rows(&self, query: &BoundQuery, limit: Option<u64>) -> StoreResult<Vec<Row>> {
        let sql = wrap(query, limit);

        let mut stmt = sqlx::query_scalar::<_, serde_json::Value>(&sql);
        for param in &query.params {
            stmt = stmt.bind(param.value.as_str());
        }
        if let Some(n) = limit {
            stmt = stmt.bind(i64::try_from(n).unwrap_or(i64::MAX));
        }

        let values = stmt.fetch_all(&self.pool).await?;
        values
            .into_iter()
            .map(|value| match value {
                serde_json::Value::Object(row) => Ok(row),
                other => Err(StoreError::Decode(format!("expected a JSON object, got {other}"))),
            })
            .collect()
    }

    fn backend_name(&self) -> &str {
        "postgres"
    }
}
