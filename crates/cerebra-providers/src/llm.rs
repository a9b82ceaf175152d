//! LLM backends over OpenAI-compatible chat completion endpoints.
//!
//! Separate instances exist for the answer model, the instruct model that
//! synthesises ground truths, and the reward model. The reward model's
//! completion is a score string `helpfulness:X,correctness:X,…` which the
//! evaluator parses.

use async_trait::async_trait;
use cerebra_config::{resolve_secret, ConfigError, LlmModelConfig};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Rate limit or timeout; the caller may retry.
    #[error("LLM backend throttled: {0}")]
    Throttled(String),
    /// Content filter or other permanent rejection.
    #[error("LLM backend rejected the request: {0}")]
    Rejected(String),
}

impl LlmError {
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Throttled(_) => true,
            LlmError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

impl From<LlmError> for cerebra_common::CerebraError {
    fn from(err: LlmError) -> Self {
        if err.is_transient() {
            cerebra_common::CerebraError::Transient(err.to_string())
        } else {
            cerebra_common::CerebraError::Internal(err.to_string())
        }
    }
}

/// Text-in, text-out completion. Prompts are fully formed by the caller;
/// temperature and max-tokens are fixed per configured model.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Reward scoring of a `(prompt, candidate)` exchange. The candidate is
/// presented as the assistant turn, as the reward model expects.
#[async_trait]
pub trait RewardModel: Send + Sync {
    async fn score(&self, prompt: &str, candidate: &str) -> Result<String, LlmError>;
}

// ── Shared chat-completions plumbing ──────────────────────────────────────────

struct ChatBackend {
    cfg: LlmModelConfig,
    api_key: Option<SecretString>,
    client: Client,
}

impl ChatBackend {
    fn new(cfg: LlmModelConfig) -> Result<Self, ConfigError> {
        let api_key = resolve_secret(&cfg.api_key_env)?;
        Ok(Self { cfg, api_key, client: Client::new() })
    }

    async fn chat(&self, messages: Vec<Value>) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.cfg.base_url.trim_end_matches('/'));
        let mut body = json!({
            "model": &self.cfg.model,
            "messages": messages,
            "temperature": self.cfg.temperature,
            "max_tokens": self.cfg.max_tokens,
        });
        if let Some(top_p) = self.cfg.top_p {
            body["top_p"] = json!(top_p);
        }

        let mut req = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.cfg.timeout_secs))
            .json(&body);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key.expose_secret());
        }
        let resp = req.send().await?;
        let status = resp.status();

        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(LlmError::Throttled(format!("{}: HTTP {status}", self.cfg.model)));
        }
        if !status.is_success() {
            let detail: Value = resp.json().await.unwrap_or_default();
            return Err(LlmError::Rejected(format!(
                "{}: HTTP {status}: {}",
                self.cfg.model,
                detail["error"]["message"].as_str().unwrap_or("unknown")
            )));
        }

        let body: Value = resp.json().await?;
        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string();
        debug!(
            model = %self.cfg.model,
            completion_tokens = body["usage"]["completion_tokens"].as_u64().unwrap_or(0),
            "Completion received"
        );
        Ok(content)
    }
}

// ── Answer / instruct model ───────────────────────────────────────────────────

pub struct ChatCompletionsLlm {
    backend: ChatBackend,
}

impl ChatCompletionsLlm {
    pub fn new(cfg: LlmModelConfig) -> Result<Self, ConfigError> {
        Ok(Self { backend: ChatBackend::new(cfg)? })
    }
}

#[async_trait]
impl LlmProvider for ChatCompletionsLlm {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.backend
            .chat(vec![json!({"role": "user", "content": prompt})])
            .await
    }
}

// ── Reward model ──────────────────────────────────────────────────────────────

pub struct RewardClient {
    backend: ChatBackend,
}

impl RewardClient {
    pub fn new(cfg: LlmModelConfig) -> Result<Self, ConfigError> {
        Ok(Self { backend: ChatBackend::new(cfg)? })
    }
}

#[async_trait]
impl RewardModel for RewardClient {
    async fn score(&self, prompt: &str, candidate: &str) -> Result<String, LlmError> {
        self.backend
            .chat(vec![
                json!({"role": "user", "content": prompt}),
                json!({"role": "assistant", "content": candidate}),
            ])
            .await
    }
}
