//! OpenAI-compatible chat completion client.
//!
//! Works against any endpoint exposing `/chat/completions` and `/models`
//! (DeepSeek, Ollama's `/v1`, vLLM, ...).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ChatClient, ChatOptions};
use crate::config::FallbackConfig;
use crate::error::ChatError;

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

/// Only the fields we read.
#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP chat client with bearer auth.
pub struct HttpChatClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    health_timeout: Duration,
}

impl HttpChatClient {
    /// Build from config, reading the API key from `config.api_key_env`.
    pub fn from_config(config: &FallbackConfig) -> reqwest::Result<Self> {
        let api_key = std::env::var(&config.api_key_env).ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            tracing::warn!(env = %config.api_key_env, "no chat API key set, sending unauthenticated requests");
        }
        Self::new(config, api_key)
    }

    pub fn new(config: &FallbackConfig, api_key: Option<String>) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(config.call_timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            health_timeout: config.health_timeout(),
        })
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }
}

fn transport_error(e: reqwest::Error) -> ChatError {
    if e.is_timeout() {
        ChatError::Timeout
    } else {
        ChatError::Unavailable(e.to_string())
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn chat(&self, system: &str, user: &str, options: &ChatOptions) -> Result<String, ChatError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = CompletionRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream: false,
        };

        let response = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Http(status.as_u16()));
        }

        let parsed: CompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ChatError::Timeout
            } else {
                ChatError::InvalidResponse(e.to_string())
            }
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ChatError::InvalidResponse("no completion content".into()))
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/models", self.base_url);
        match self
            .authorized(self.client.get(&url))
            .timeout(self.health_timeout)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "chat health check failed");
                false
            }
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}
