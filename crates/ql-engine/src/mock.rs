//! In-memory collaborators for tests and sample mode.
//!
//! `MockDataStore` serves a fixed row set, optionally filtered by bound
//! entity values. `MockChatClient` replays scripted replies or failures.
//! Both record what they were asked.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use ql_protocol::Row;

use crate::binder::BoundQuery;
use crate::error::{ChatError, StoreError, StoreResult};
use crate::executor::DataStore;
use crate::fallback::{ChatClient, ChatOptions};

/// Fixed-row data store.
pub struct MockDataStore {
    rows: Vec<Row>,
    /// (entity, column): keep rows whose `column` equals the bound entity value.
    filters: Vec<(String, String)>,
    error: Option<String>,
    delay: Option<Duration>,
    executed: Mutex<Vec<(BoundQuery, Option<u64>)>>,
}

impl MockDataStore {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            filters: Vec::new(),
            error: None,
            delay: None,
            executed: Mutex::new(Vec::new()),
        }
    }

    /// A store whose every query fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::new(Vec::new())
        }
    }

    /// Filter rows on `column` whenever the query binds `entity`.
    pub fn filter_on(mut self, entity: impl Into<String>, column: impl Into<String>) -> Self {
        self.filters.push((entity.into(), column.into()));
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every query received, with the limit it was called with.
    pub fn executed(&self) -> Vec<(BoundQuery, Option<u64>)> {
        self.executed.lock().unwrap().clone()
    }
}

impl Default for MockDataStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl DataStore for MockDataStore {
    async fn fetch_rows(&self, query: &BoundQuery, limit: Option<u64>) -> StoreResult<Vec<Row>> {
        self.executed.lock().unwrap().push((query.clone(), limit));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.error {
            return Err(StoreError::Query(message.clone()));
        }

        let rows = self.rows.iter().filter(|row| {
            self.filters.iter().all(|(entity, column)| match query.param(entity) {
                Some(wanted) => row.get(column).and_then(Value::as_str) == Some(wanted),
                None => true,
            })
        });
        let cap = limit.map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));
        Ok(rows.take(cap).cloned().collect())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

/// Scripted chat collaborator.
pub struct MockChatClient {
    /// Results returned in order; the last one repeats once the queue drains.
    script: Mutex<VecDeque<Result<String, ChatError>>>,
    healthy: bool,
    calls: Mutex<Vec<String>>,
    health_checks: Mutex<u32>,
}

impl MockChatClient {
    fn with_script(script: Vec<Result<String, ChatError>>, healthy: bool) -> Self {
        Self {
            script: Mutex::new(script.into()),
            healthy,
            calls: Mutex::new(Vec::new()),
            health_checks: Mutex::new(0),
        }
    }

    /// Always answers `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self::with_script(vec![Ok(reply.into())], true)
    }

    /// Always fails with `error`.
    pub fn failing(error: ChatError) -> Self {
        Self::with_script(vec![Err(error)], true)
    }

    /// Fails `failures` times with `error`, then answers `reply`.
    pub fn flaky(failures: usize, error: ChatError, reply: impl Into<String>) -> Self {
        let mut script: Vec<_> = (0..failures).map(|_| Err(error.clone())).collect();
        script.push(Ok(reply.into()));
        Self::with_script(script, true)
    }

    /// Reports unhealthy and fails every call.
    pub fn unhealthy() -> Self {
        Self::with_script(vec![Err(ChatError::Unavailable("mock is down".into()))], false)
    }

    /// User prompts received by `chat`, one per attempt.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn health_checks(&self) -> u32 {
        *self.health_checks.lock().unwrap()
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn chat(&self, _system: &str, user: &str, _options: &ChatOptions) -> Result<String, ChatError> {
        self.calls.lock().unwrap().push(user.to_string());
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap_or(Err(ChatError::InvalidResponse("empty script".into())))
        } else {
            script
                .front()
                .cloned()
                .unwrap_or(Err(ChatError::InvalidResponse("empty script".into())))
        }
    }

    async fn health_check(&self) -> bool {
        *self.health_checks.lock().unwrap() += 1;
        self.healthy
    }

    fn name(&self) -> &str {
        "mock"
    }
}
