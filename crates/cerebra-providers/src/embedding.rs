//! Embedding backends — dense via an OpenAI-compatible `/embeddings`
//! endpoint, sparse via a TEI-style `/embed_sparse` endpoint.

use async_trait::async_trait;
use cerebra_common::SparseVector;
use cerebra_config::{resolve_secret, ConfigError, DenseEmbeddingConfig, SparseEmbeddingConfig};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Embedding backend error: {0}")]
    Backend(String),
    #[error("Malformed embedding: {0}")]
    Malformed(String),
}

impl From<EmbeddingError> for cerebra_common::CerebraError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::Http(e) if e.is_timeout() || e.is_connect() => {
                cerebra_common::CerebraError::Transient(e.to_string())
            }
            EmbeddingError::Backend(msg) => cerebra_common::CerebraError::Transient(msg),
            e => cerebra_common::CerebraError::Internal(e.to_string()),
        }
    }
}

/// Encode text into the two vector spaces every point carries.
/// Both calls are deterministic for a fixed model.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_dense(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
    async fn embed_sparse(&self, text: &str) -> Result<SparseVector, EmbeddingError>;
}

// ── HTTP implementation ───────────────────────────────────────────────────────

pub struct RemoteEmbeddings {
    dense_cfg: DenseEmbeddingConfig,
    sparse_cfg: SparseEmbeddingConfig,
    dense_key: Option<SecretString>,
    sparse_key: Option<SecretString>,
    client: Client,
}

impl RemoteEmbeddings {
    pub fn new(
        dense_cfg: DenseEmbeddingConfig,
        sparse_cfg: SparseEmbeddingConfig,
    ) -> Result<Self, ConfigError> {
        let dense_key = resolve_secret(&dense_cfg.api_key_env)?;
        let sparse_key = resolve_secret(&sparse_cfg.api_key_env)?;
        Ok(Self { dense_cfg, sparse_cfg, dense_key, sparse_key, client: Client::new() })
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbeddings {
    async fn embed_dense(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/embeddings", self.dense_cfg.base_url.trim_end_matches('/'));
        let body = json!({ "model": &self.dense_cfg.model, "input": text });
        let mut req = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.dense_cfg.timeout_secs))
            .json(&body);
        if let Some(ref key) = self.dense_key {
            req = req.bearer_auth(key.expose_secret());
        }
        let resp: Value = req.send().await?.error_for_status()?.json().await?;

        let vector: Vec<f32> = resp["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| EmbeddingError::Backend("no embedding in response".to_string()))?
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        if vector.len() != self.dense_cfg.dim {
            return Err(EmbeddingError::Malformed(format!(
                "dense dim {} != configured {}",
                vector.len(),
                self.dense_cfg.dim
            )));
        }
        debug!(dim = vector.len(), "Dense embedding created");
        Ok(vector)
    }

    async fn embed_sparse(&self, text: &str) -> Result<SparseVector, EmbeddingError> {
        let url = format!("{}/embed_sparse", self.sparse_cfg.base_url.trim_end_matches('/'));
        let body = json!({ "inputs": text });
        let mut req = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.sparse_cfg.timeout_secs))
            .json(&body);
        if let Some(ref key) = self.sparse_key {
            req = req.bearer_auth(key.expose_secret());
        }
        let resp: Value = req.send().await?.error_for_status()?.json().await?;

        // TEI returns one `[{index, value}, …]` row per input.
        let row = resp[0]
            .as_array()
            .ok_or_else(|| EmbeddingError::Backend("no sparse row in response".to_string()))?;
        let mut pairs: Vec<(u32, f32)> = row
            .iter()
            .map(|e| {
                (
                    e["index"].as_u64().unwrap_or(0) as u32,
                    e["value"].as_f64().unwrap_or(0.0) as f32,
                )
            })
            .collect();
        pairs.sort_by_key(|(i, _)| *i);
        pairs.dedup_by_key(|(i, _)| *i);

        let sparse = SparseVector {
            indices: pairs.iter().map(|(i, _)| *i).collect(),
            values: pairs.iter().map(|(_, v)| *v).collect(),
        };
        if !sparse.is_well_formed() {
            return Err(EmbeddingError::Malformed("sparse indices not strictly ascending".into()));
        }
        debug!(nnz = sparse.indices.len(), "Sparse embedding created");
        Ok(sparse)
    }
}
