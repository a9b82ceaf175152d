//! Deterministic embedding fake. Token-hash vectors give related texts a
//! higher cosine/dot score than unrelated ones, which is all the
//! retrieval tests need.

use async_trait::async_trait;
use cerebra_common::SparseVector;
use cerebra_providers::{EmbeddingError, EmbeddingProvider};
use std::collections::BTreeMap;

pub struct FakeEmbeddings {
    pub dim: usize,
    /// Fail dense embedding for texts containing this marker.
    pub fail_dense_on: Option<String>,
    /// Fail sparse embedding for texts containing this marker.
    pub fail_sparse_on: Option<String>,
}

impl Default for FakeEmbeddings {
    fn default() -> Self {
        Self { dim: 48, fail_dense_on: None, fail_sparse_on: None }
    }
}

impl FakeEmbeddings {
    pub fn new() -> Self {
        Self::default()
    }

    fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
    }
}

fn fnv64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 14695981039346656037;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    hash
}

#[async_trait]
impl EmbeddingProvider for FakeEmbeddings {
    async fn embed_dense(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if let Some(ref marker) = self.fail_dense_on {
            if text.contains(marker) {
                return Err(EmbeddingError::Backend("dense embedding stubbed to fail".into()));
            }
        }
        let mut vector = vec![0.0f32; self.dim];
        for token in Self::tokens(text) {
            vector[(fnv64(token.as_bytes()) % self.dim as u64) as usize] += 1.0;
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-10);
        Ok(vector.into_iter().map(|x| x / norm).collect())
    }

    async fn embed_sparse(&self, text: &str) -> Result<SparseVector, EmbeddingError> {
        if let Some(ref marker) = self.fail_sparse_on {
            if text.contains(marker) {
                return Err(EmbeddingError::Backend("sparse embedding stubbed to fail".into()));
            }
        }
        let mut weights: BTreeMap<u32, f32> = BTreeMap::new();
        for token in Self::tokens(text) {
            *weights.entry((fnv64(token.as_bytes()) % 10_000) as u32).or_insert(0.0) += 1.0;
        }
        Ok(SparseVector {
            indices: weights.keys().copied().collect(),
            values: weights.values().copied().collect(),
        })
    }
}
