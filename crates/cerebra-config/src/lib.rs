//! Configuration loading for Cerebra.
//! Reads cerebra.toml from the current directory or the path in the
//! CEREBRA_CONFIG env var. API keys are referenced by env-var name in the
//! TOML (`api_key_env = "GROQ_API_KEY"`) and resolved at boot, so secrets
//! never live in the config file itself.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Missing secret: env var '{0}' is not set")]
    MissingSecret(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub reranker: RerankerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

/// Target corpus for the spreadsheet-driven batch evaluator.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EvaluationConfig {
    /// Brain the batch evaluator runs against.
    pub brain_id: Option<String>,
    /// Optional pdf_id scoping for batch evaluation queries.
    #[serde(default)]
    pub selected_pdfs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8000 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default = "default_store_url")]
    pub url: String,
    /// Collection mapping files to brains, used for listing and dedup.
    #[serde(default = "default_registry")]
    pub registry_collection: String,
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_upsert_retries")]
    pub upsert_retries: u32,
}

fn default_store_url() -> String { "http://localhost:6333".to_string() }
fn default_registry() -> String { "data_registry".to_string() }
fn default_store_timeout() -> u64 { 30 }
fn default_upsert_retries() -> u32 { 3 }

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            registry_collection: default_registry(),
            timeout_secs: default_store_timeout(),
            upsert_retries: default_upsert_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub dense: DenseEmbeddingConfig,
    #[serde(default)]
    pub sparse: SparseEmbeddingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseEmbeddingConfig {
    #[serde(default = "default_embed_url")]
    pub base_url: String,
    #[serde(default = "default_dense_model")]
    pub model: String,
    /// Dense dimensionality of the configured model.
    #[serde(default = "default_dim")]
    pub dim: usize,
    pub api_key_env: Option<String>,
    #[serde(default = "default_embed_timeout")]
    pub timeout_secs: u64,
}

fn default_embed_url() -> String { "http://localhost:8080".to_string() }
fn default_dense_model() -> String { "sentence-transformers/all-mpnet-base-v2".to_string() }
fn default_dim() -> usize { 768 }
fn default_embed_timeout() -> u64 { 30 }

impl Default for DenseEmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_embed_url(),
            model: default_dense_model(),
            dim: default_dim(),
            api_key_env: None,
            timeout_secs: default_embed_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparseEmbeddingConfig {
    #[serde(default = "default_sparse_url")]
    pub base_url: String,
    #[serde(default = "default_sparse_model")]
    pub model: String,
    pub api_key_env: Option<String>,
    #[serde(default = "default_embed_timeout")]
    pub timeout_secs: u64,
}

fn default_sparse_url() -> String { "http://localhost:8081".to_string() }
fn default_sparse_model() -> String { "prithivida/Splade_PP_en_v1".to_string() }

impl Default for SparseEmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_sparse_url(),
            model: default_sparse_model(),
            api_key_env: None,
            timeout_secs: default_embed_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankerConfig {
    #[serde(default = "default_rerank_url")]
    pub base_url: String,
    #[serde(default = "default_rerank_model")]
    pub model: String,
    pub api_key_env: Option<String>,
    /// Documents kept after reranking.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Candidates fetched from the store before reranking.
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,
    #[serde(default = "default_embed_timeout")]
    pub timeout_secs: u64,
}

fn default_rerank_url() -> String { "http://localhost:8082".to_string() }
fn default_rerank_model() -> String { "cross-encoder/ms-marco-MiniLM-L-6-v2".to_string() }
fn default_top_k() -> usize { 4 }
fn default_candidate_limit() -> usize { 20 }

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            base_url: default_rerank_url(),
            model: default_rerank_model(),
            api_key_env: None,
            top_k: default_top_k(),
            candidate_limit: default_candidate_limit(),
            timeout_secs: default_embed_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model that answers user questions.
    #[serde(default = "LlmModelConfig::default_answer")]
    pub answer: LlmModelConfig,
    /// Instruct model that synthesises ground truths for evaluation.
    #[serde(default = "LlmModelConfig::default_instruct")]
    pub instruct: LlmModelConfig,
    /// Reward model scoring answers and retrieved context.
    #[serde(default = "LlmModelConfig::default_reward")]
    pub reward: LlmModelConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            answer: LlmModelConfig::default_answer(),
            instruct: LlmModelConfig::default_instruct(),
            reward: LlmModelConfig::default_reward(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmModelConfig {
    pub base_url: String,
    pub model: String,
    pub api_key_env: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    pub top_p: Option<f32>,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_temperature() -> f32 { 0.5 }
fn default_max_tokens() -> u32 { 3500 }
fn default_llm_timeout() -> u64 { 60 }

impl LlmModelConfig {
    fn default_answer() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_key_env: Some("GROQ_API_KEY".to_string()),
            temperature: 0.5,
            max_tokens: 3500,
            top_p: None,
            timeout_secs: default_llm_timeout(),
        }
    }

    fn default_instruct() -> Self {
        Self {
            base_url: "https://integrate.api.nvidia.com/v1".to_string(),
            model: "nvidia/nemotron-4-340b-instruct".to_string(),
            api_key_env: Some("NVIDIA_API_KEY".to_string()),
            temperature: 0.4,
            max_tokens: 1400,
            top_p: Some(0.7),
            timeout_secs: default_llm_timeout(),
        }
    }

    fn default_reward() -> Self {
        Self {
            base_url: "https://integrate.api.nvidia.com/v1".to_string(),
            model: "nvidia/nemotron-4-340b-reward".to_string(),
            api_key_env: Some("NVIDIA_API_KEY".to_string()),
            temperature: 0.0,
            max_tokens: 128,
            top_p: None,
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl Default for LlmModelConfig {
    fn default() -> Self {
        Self::default_answer()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Token-bucket quota for answer-model calls, per minute.
    #[serde(default = "default_answer_rpm")]
    pub answer_rpm: u32,
    /// Deadline for one strategy inside `answer_all`.
    #[serde(default = "default_strategy_timeout")]
    pub strategy_timeout_secs: u64,
}

fn default_answer_rpm() -> u32 { 15 }
fn default_strategy_timeout() -> u64 { 90 }

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            answer_rpm: default_answer_rpm(),
            strategy_timeout_secs: default_strategy_timeout(),
        }
    }
}

impl Config {
    /// Load from CEREBRA_CONFIG, falling back to ./cerebra.toml, falling
    /// back to built-in defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CEREBRA_CONFIG").unwrap_or_else(|_| "cerebra.toml".to_string());
        if Path::new(&path).exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

/// Resolve an `api_key_env` reference into the secret it names.
/// `None` stays `None` (the backend is keyless); a named but unset env var
/// is an error so misconfiguration fails at boot, not mid-request.
pub fn resolve_secret(api_key_env: &Option<String>) -> Result<Option<SecretString>, ConfigError> {
    match api_key_env {
        None => Ok(None),
        Some(name) => match std::env::var(name) {
            Ok(val) => Ok(Some(SecretString::from(val))),
            Err(_) => Err(ConfigError::MissingSecret(name.clone())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.embedding.dense.dim, 768);
        assert_eq!(cfg.reranker.top_k, 4);
        assert_eq!(cfg.reranker.candidate_limit, 20);
        assert_eq!(cfg.vector_store.registry_collection, "data_registry");
        assert_eq!(cfg.llm.reward.model, "nvidia/nemotron-4-340b-reward");
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let cfg: Config = toml::from_str(
            r#"
            [vector_store]
            url = "http://qdrant:6333"

            [reranker]
            top_k = 6
            "#,
        )
        .unwrap();
        assert_eq!(cfg.vector_store.url, "http://qdrant:6333");
        assert_eq!(cfg.vector_store.timeout_secs, 30);
        assert_eq!(cfg.reranker.top_k, 6);
    }

    #[test]
    fn missing_secret_env_is_an_error() {
        let err = resolve_secret(&Some("CEREBRA_NO_SUCH_KEY".to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret(_)));
        assert!(resolve_secret(&None).unwrap().is_none());
    }
}
