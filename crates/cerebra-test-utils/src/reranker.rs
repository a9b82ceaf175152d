//! Token-overlap reranker fake. Honours the rerank contract: at most `k`
//! results, scores non-increasing, ties stable on original order.

use async_trait::async_trait;
use cerebra_providers::reranker::{take_top_k, RankedDoc, RerankError, RerankerProvider};
use std::collections::HashSet;

#[derive(Default)]
pub struct OverlapReranker;

impl OverlapReranker {
    pub fn new() -> Self {
        Self
    }

    fn token_set(text: &str) -> HashSet<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect()
    }
}

#[async_trait]
impl RerankerProvider for OverlapReranker {
    async fn rerank(
        &self,
        query: &str,
        docs: &[String],
        k: usize,
    ) -> Result<Vec<RankedDoc>, RerankError> {
        let query_tokens = Self::token_set(query);
        let ranked = docs
            .iter()
            .enumerate()
            .map(|(index, doc)| {
                let doc_tokens = Self::token_set(doc);
                let overlap = query_tokens.intersection(&doc_tokens).count();
                let score = if query_tokens.is_empty() {
                    0.0
                } else {
                    overlap as f32 / query_tokens.len() as f32
                };
                RankedDoc { index, score }
            })
            .collect();
        Ok(take_top_k(ranked, k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rerank_prefers_overlapping_documents() {
        let reranker = OverlapReranker::new();
        let docs = vec![
            "nothing in common".to_string(),
            "The capital of Atlantis is Orichalcum.".to_string(),
        ];
        let top = reranker.rerank("capital of Atlantis", &docs, 4).await.unwrap();
        assert_eq!(top[0].index, 1);
    }

    #[tokio::test]
    async fn rerank_respects_k_and_empty_input() {
        let reranker = OverlapReranker::new();
        assert!(reranker.rerank("q", &[], 4).await.unwrap().is_empty());

        let docs: Vec<String> = (0..10).map(|i| format!("doc {i}")).collect();
        let top = reranker.rerank("doc", &docs, 4).await.unwrap();
        assert_eq!(top.len(), 4);
        // All scores tie, so original order is preserved.
        assert_eq!(top.iter().map(|r| r.index).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }
}
