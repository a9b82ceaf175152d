//! The `VectorStore` capability trait and its error type.

use async_trait::async_trait;
use cerebra_common::CerebraError;
use thiserror::Error;

use crate::types::{
    AliasInfo, Filter, PointStruct, QuerySpec, RecordPoint, ScoredPoint,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Transient store failure: {0}")]
    Transient(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Unexpected store response: {0}")]
    Unexpected(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Transient(_) => true,
            StoreError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

impl From<StoreError> for CerebraError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::CollectionNotFound(name) => CerebraError::NotFound(name),
            e if e.is_transient() => CerebraError::Transient(e.to_string()),
            e => CerebraError::Internal(e.to_string()),
        }
    }
}

/// Thin typed contract over the remote vector DB. One implementation per
/// backend plus an in-memory fake for tests.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a collection with named vectors `dense` (cosine, `dense_dim`)
    /// and `sparse`. Idempotent: an existing collection is a no-op.
    async fn create_collection(&self, name: &str, dense_dim: usize) -> Result<(), StoreError>;

    /// Drop a collection. Used only to roll back a failed brain creation.
    async fn delete_collection(&self, name: &str) -> Result<(), StoreError>;

    /// At-least-once upsert; implementations retry transient failures with
    /// bounded exponential backoff.
    async fn upsert(&self, collection: &str, points: Vec<PointStruct>) -> Result<(), StoreError>;

    /// Similarity query: single named vector or server-side RRF fusion.
    async fn query_points(
        &self,
        collection: &str,
        query: QuerySpec,
        filter: Option<Filter>,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, StoreError>;

    /// Page through payloads, no vectors.
    async fn scroll(
        &self,
        collection: &str,
        filter: Option<Filter>,
        limit: usize,
    ) -> Result<Vec<RecordPoint>, StoreError>;

    async fn count(&self, collection: &str) -> Result<usize, StoreError>;

    async fn create_alias(&self, collection: &str, alias: &str) -> Result<(), StoreError>;

    async fn list_aliases(&self) -> Result<Vec<AliasInfo>, StoreError>;
}
