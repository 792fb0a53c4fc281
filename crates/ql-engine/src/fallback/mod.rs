//! Conversational fallback for queries no rule matches.
//!
//! The orchestrator wraps a [`ChatClient`] with a call timeout, bounded
//! retries with exponential backoff, and a cached availability flag. It
//! never fails: when the collaborator is down or keeps erroring, the
//! caller gets a deterministic degraded message instead.

pub mod http;
pub mod monitor;
pub mod retry;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::config::FallbackConfig;
use crate::error::ChatError;
use crate::rules::RuleCatalog;

pub use http::HttpChatClient;
pub use retry::RetryPolicy;

/// Sampling parameters for one chat call.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

/// An external conversational AI service.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// One completion for `user`, steered by `system`.
    async fn chat(&self, system: &str, user: &str, options: &ChatOptions) -> Result<String, ChatError>;

    /// Cheap reachability probe.
    async fn health_check(&self) -> bool;

    /// Client label for logs.
    fn name(&self) -> &str;
}

/// How many example questions the degraded message suggests.
const SUGGESTIONS: usize = 3;
/// Sample values per entity shown to the model.
const PROMPT_SAMPLES: usize = 4;

const SYSTEM_PROMPT: &str = "你是制造业质量管理系统（QMS）的智能助手，熟悉来料检验、库存管理、上线跟踪和供应商质量。\
请用简洁的中文回答用户的问题；如果问题需要查询具体数据，请提示用户换用包含供应商、物料或工厂名称的结构化问法。";

#[derive(Debug, Clone, Copy)]
struct Health {
    available: bool,
    checked_at: Option<Instant>,
}

/// Routes unmatched queries to the conversational collaborator.
pub struct FallbackOrchestrator {
    client: Option<Arc<dyn ChatClient>>,
    retry: RetryPolicy,
    call_timeout: Duration,
    health_timeout: Duration,
    health_interval: Duration,
    options: ChatOptions,
    health: RwLock<Health>,
}

impl FallbackOrchestrator {
    pub fn new(client: Arc<dyn ChatClient>, config: &FallbackConfig) -> Self {
        Self {
            client: Some(client),
            retry: RetryPolicy::from(&config.retry),
            call_timeout: config.call_timeout(),
            health_timeout: config.health_timeout(),
            health_interval: config.health_interval(),
            options: ChatOptions {
                temperature: config.temperature,
                max_tokens: config.max_tokens,
            },
            // Assume reachable until a call or probe says otherwise.
            health: RwLock::new(Health {
                available: true,
                checked_at: None,
            }),
        }
    }

    /// No collaborator: every fallback is the degraded message.
    pub fn disabled() -> Self {
        let config = FallbackConfig::default();
        Self {
            client: None,
            health: RwLock::new(Health {
                available: false,
                checked_at: None,
            }),
            ..Self::new(Arc::new(NoChat), &config)
        }
    }

    /// HTTP collaborator when `config.enabled`, otherwise [`disabled`](Self::disabled).
    pub fn from_config(config: &FallbackConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        match HttpChatClient::from_config(config) {
            Ok(client) => {
                tracing::info!(base_url = %config.base_url, model = %config.model, "conversational fallback enabled");
                Self::new(Arc::new(client), config)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to build chat client, fallback disabled");
                Self::disabled()
            }
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Cached availability.
    pub async fn is_available(&self) -> bool {
        self.client.is_some() && self.health.read().await.available
    }

    /// Probe the collaborator now and cache the result.
    pub async fn refresh_health(&self) -> bool {
        let Some(client) = &self.client else {
            return false;
        };
        let healthy = tokio::time::timeout(self.health_timeout, client.health_check())
            .await
            .unwrap_or(false);

        let mut health = self.health.write().await;
        if health.available != healthy {
            tracing::info!(client = client.name(), available = healthy, "chat availability changed");
        }
        *health = Health {
            available: healthy,
            checked_at: Some(Instant::now()),
        };
        healthy
    }

    /// Answer `query` conversationally. Never fails.
    pub async fn answer(&self, query: &str, catalog: &RuleCatalog) -> String {
        let Some(client) = &self.client else {
            return degraded_message(query, catalog);
        };

        if !self.ready().await {
            tracing::debug!("chat collaborator unavailable, answering degraded");
            return degraded_message(query, catalog);
        }

        let system = system_prompt(catalog);
        let attempts = self.retry.attempts();
        for attempt in 1..=attempts {
            let result = match tokio::time::timeout(self.call_timeout, client.chat(&system, query, &self.options)).await
            {
                Ok(result) => result,
                Err(_) => Err(ChatError::Timeout),
            };

            match result {
                Ok(text) => {
                    self.mark(true).await;
                    return text;
                }
                Err(e) => {
                    tracing::warn!(client = client.name(), attempt, error = %e, "chat call failed");
                    if !e.is_retryable() || attempt == attempts {
                        break;
                    }
                    tokio::time::sleep(self.retry.delay_for(attempt)).await;
                }
            }
        }

        self.mark(false).await;
        degraded_message(query, catalog)
    }

    /// Available, or unavailable long enough ago that it is worth probing again.
    async fn ready(&self) -> bool {
        let health = *self.health.read().await;
        if health.available {
            return true;
        }
        let stale = health
            .checked_at
            .is_none_or(|at| at.elapsed() >= self.health_interval);
        stale && self.refresh_health().await
    }

    async fn mark(&self, available: bool) {
        let mut health = self.health.write().await;
        *health = Health {
            available,
            checked_at: Some(Instant::now()),
        };
    }
}

/// Placeholder client behind [`FallbackOrchestrator::disabled`]; never called.
struct NoChat;

#[async_trait]
impl ChatClient for NoChat {
    async fn chat(&self, _system: &str, _user: &str, _options: &ChatOptions) -> Result<String, ChatError> {
        Err(ChatError::Unavailable("fallback disabled".into()))
    }

    async fn health_check(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

fn system_prompt(catalog: &RuleCatalog) -> String {
    let known = catalog.lexicon().summary(PROMPT_SAMPLES);
    if known.is_empty() {
        SYSTEM_PROMPT.to_string()
    } else {
        format!("{SYSTEM_PROMPT}\n系统已知的实体类别及示例：{known}")
    }
}

/// Fixed reply used when the collaborator cannot answer.
pub fn degraded_message(query: &str, catalog: &RuleCatalog) -> String {
    let examples: Vec<&str> = catalog
        .list_active_rules()
        .iter()
        .take(SUGGESTIONS)
        .map(|r| r.intent_name.as_str())
        .collect();

    if examples.is_empty() {
        format!("抱歉，智能问答服务暂时不可用，暂时无法回答「{query}」，请稍后再试。")
    } else {
        format!(
            "抱歉，智能问答服务暂时不可用，暂时无法回答「{query}」。您可以尝试以下查询：{}。",
            examples.join("、")
        )
    }
}
