//! Cross-encoder reranking over a TEI-style `/rerank` endpoint.

use async_trait::async_trait;
use cerebra_config::{resolve_secret, ConfigError, RerankerConfig};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RerankError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Reranker backend error: {0}")]
    Backend(String),
}

impl From<RerankError> for cerebra_common::CerebraError {
    fn from(err: RerankError) -> Self {
        match err {
            RerankError::Http(e) if e.is_timeout() || e.is_connect() => {
                cerebra_common::CerebraError::Transient(e.to_string())
            }
            RerankError::Backend(msg) => cerebra_common::CerebraError::Transient(msg),
            e => cerebra_common::CerebraError::Internal(e.to_string()),
        }
    }
}

/// A document's position after cross-encoder scoring. `index` refers to
/// the caller's original candidate order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedDoc {
    pub index: usize,
    pub score: f32,
}

/// Score `(query, doc)` pairs in one batched call and keep the top `k`,
/// ordered by score descending with ties broken by original retrieval
/// rank (stable). Empty input returns empty output.
#[async_trait]
pub trait RerankerProvider: Send + Sync {
    async fn rerank(
        &self,
        query: &str,
        docs: &[String],
        k: usize,
    ) -> Result<Vec<RankedDoc>, RerankError>;
}

/// Order scored pairs into the final ranking. Shared by every
/// implementation so the contract (descending, stable, ≤ k) holds
/// regardless of backend.
pub fn take_top_k(mut ranked: Vec<RankedDoc>, k: usize) -> Vec<RankedDoc> {
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.index.cmp(&b.index))
    });
    ranked.truncate(k);
    ranked
}

// ── HTTP implementation ───────────────────────────────────────────────────────

pub struct TeiReranker {
    cfg: RerankerConfig,
    api_key: Option<SecretString>,
    client: Client,
}

impl TeiReranker {
    pub fn new(cfg: RerankerConfig) -> Result<Self, ConfigError> {
        let api_key = resolve_secret(&cfg.api_key_env)?;
        Ok(Self { cfg, api_key, client: Client::new() })
    }
}

#[async_trait]
impl RerankerProvider for TeiReranker {
    async fn rerank(
        &self,
        query: &str,
        docs: &[String],
        k: usize,
    ) -> Result<Vec<RankedDoc>, RerankError> {
        if docs.is_empty() {
            return Ok(vec![]);
        }
        let url = format!("{}/rerank", self.cfg.base_url.trim_end_matches('/'));
        let body = json!({ "query": query, "texts": docs });
        let mut req = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.cfg.timeout_secs))
            .json(&body);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key.expose_secret());
        }
        let resp: Value = req.send().await?.error_for_status()?.json().await?;

        let ranked: Vec<RankedDoc> = resp
            .as_array()
            .ok_or_else(|| RerankError::Backend("rerank response is not a list".to_string()))?
            .iter()
            .map(|e| RankedDoc {
                index: e["index"].as_u64().unwrap_or(0) as usize,
                score: e["score"].as_f64().unwrap_or(0.0) as f32,
            })
            .collect();

        debug!(candidates = docs.len(), kept = k.min(ranked.len()), "Documents reranked");
        Ok(take_top_k(ranked, k))
    }
}
