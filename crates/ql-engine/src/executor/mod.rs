//! Query execution against a row store.
//!
//! No row cap is ever implied here. A cap is an explicit per-call
//! argument (or the explicit `executor.max_rows` setting).

mod postgres;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use ql_protocol::Row;

use crate::binder::BoundQuery;
use crate::config::ExecutorConfig;
use crate::error::{StoreError, StoreResult};

pub use postgres::PgDataStore;

/// A read-only tabular data store.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Run one bound read-only statement. `limit` is the caller's explicit
    /// cap; `None` returns every row.
    async fn fetch_rows(&self, query: &BoundQuery, limit: Option<u64>) -> StoreResult<Vec<Row>>;

    /// Backend label for logs.
    fn backend_name(&self) -> &str;
}

/// Runs bound queries with a timeout.
#[derive(Clone)]
pub struct QueryExecutor {
    store: Arc<dyn DataStore>,
    timeout: Duration,
    max_rows: Option<u64>,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn DataStore>, config: &ExecutorConfig) -> Self {
        Self {
            store,
            timeout: config.query_timeout(),
            max_rows: config.max_rows,
        }
    }

    /// Execute `query`. The effective cap is `limit`, else the configured
    /// `max_rows`, else none.
    pub async fn execute(&self, query: &BoundQuery, limit: Option<u64>) -> StoreResult<Vec<Row>> {
        let limit = limit.or(self.max_rows);
        tracing::debug!(
            backend = self.store.backend_name(),
            params = query.params.len(),
            limit = ?limit,
            "executing bound query"
        );

        match tokio::time::timeout(self.timeout, self.store.fetch_rows(query, limit)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }

    pub fn backend_name(&self) -> &str {
        self.store.backend_name()
    }
}
