//! Retrieval strategies over a single brain.
//!
//! All four strategies share the same scaffold: build a store query,
//! optionally scoped to the selected PDFs, fetch candidates, then rerank
//! with the cross-encoder down to the configured top-K. HyDE swaps the
//! query embedding for the embedding of an LLM-written hypothetical
//! document but reranks against the original query.

use std::sync::Arc;
use tracing::{debug, info, instrument};

use cerebra_common::Result;
use cerebra_providers::{EmbeddingProvider, LlmProvider, RerankerProvider};
use cerebra_vectorstore::{
    Filter, Fusion, Prefetch, PrefetchQuery, QuerySpec, ScoredPoint, VectorStore,
};

use crate::prompts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Dense,
    Sparse,
    Hybrid,
    Hyde,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Dense => "dense",
            Strategy::Sparse => "sparse",
            Strategy::Hybrid => "hybrid",
            Strategy::Hyde => "hyde",
        }
    }
}

/// Reranked documents plus their concatenation, ready for prompting.
#[derive(Debug, Clone)]
pub struct RetrievedContext {
    pub documents: Vec<ScoredPoint>,
    pub combined: String,
}

impl RetrievedContext {
    fn from_documents(documents: Vec<ScoredPoint>) -> Self {
        let combined = documents
            .iter()
            .filter_map(|p| p.payload.as_chunk().map(|c| c.content.as_str()))
            .collect::<Vec<_>>()
            .join(" ");
        Self { documents, combined }
    }
}

pub struct Retriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    reranker: Arc<dyn RerankerProvider>,
    hyde_llm: Arc<dyn LlmProvider>,
    top_k: usize,
    candidate_limit: usize,
}

impl Retriever {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        reranker: Arc<dyn RerankerProvider>,
        hyde_llm: Arc<dyn LlmProvider>,
        top_k: usize,
        candidate_limit: usize,
    ) -> Self {
        Self { store, embedder, reranker, hyde_llm, top_k, candidate_limit }
    }

    /// Run one strategy. An empty `pdf_ids` searches the whole brain.
    #[instrument(skip(self, strategy, query, pdf_ids), fields(strategy = strategy.as_str()))]
    pub async fn retrieve(
        &self,
        brain_id: &str,
        strategy: Strategy,
        query: &str,
        pdf_ids: &[String],
    ) -> Result<RetrievedContext> {
        let filter = scope_filter(pdf_ids);
        let candidates = match strategy {
            Strategy::Dense => {
                let q = self.embedder.embed_dense(query).await?;
                self.store
                    .query_points(brain_id, QuerySpec::Dense(q), filter, self.candidate_limit)
                    .await?
            }
            Strategy::Sparse => {
                let q = self.embedder.embed_sparse(query).await?;
                self.store
                    .query_points(brain_id, QuerySpec::Sparse(q), filter, self.candidate_limit)
                    .await?
            }
            Strategy::Hybrid => {
                let dense = self.embedder.embed_dense(query).await?;
                let sparse = self.embedder.embed_sparse(query).await?;
                let spec = QuerySpec::Fusion {
                    prefetches: vec![
                        Prefetch {
                            query: PrefetchQuery::Sparse(sparse),
                            limit: self.candidate_limit,
                        },
                        Prefetch { query: PrefetchQuery::Dense(dense), limit: self.candidate_limit },
                    ],
                    fusion: Fusion::Rrf,
                };
                self.store.query_points(brain_id, spec, filter, self.candidate_limit).await?
            }
            Strategy::Hyde => {
                let hypothetical = self.hyde_llm.complete(&prompts::hyde_prompt(query)).await?;
                debug!(chars = hypothetical.len(), "Hypothetical document generated");
                let q = self.embedder.embed_dense(&hypothetical).await?;
                self.store
                    .query_points(brain_id, QuerySpec::Dense(q), filter, self.candidate_limit)
                    .await?
            }
        };

        // HyDE reranks against the original query, not the hypothetical.
        let documents = self.rerank(query, candidates).await?;
        info!(brain_id, n = documents.len(), "Retrieval complete");
        Ok(RetrievedContext::from_documents(documents))
    }

    async fn rerank(&self, query: &str, candidates: Vec<ScoredPoint>) -> Result<Vec<ScoredPoint>> {
        if candidates.is_empty() {
            return Ok(vec![]);
        }
        let texts: Vec<String> = candidates
            .iter()
            .map(|p| p.payload.as_chunk().map(|c| c.content.clone()).unwrap_or_default())
            .collect();
        let ranked = self.reranker.rerank(query, &texts, self.top_k).await?;
        Ok(ranked
            .into_iter()
            .filter_map(|r| {
                candidates.get(r.index).cloned().map(|mut p| {
                    p.score = r.score;
                    p
                })
            })
            .collect())
    }
}

/// `pdf_id ∈ ids` scoping; empty means no filter at all.
fn scope_filter(pdf_ids: &[String]) -> Option<Filter> {
    if pdf_ids.is_empty() {
        None
    } else {
        Some(Filter::must_match_any("metadata.pdf_id", pdf_ids.to_vec()))
    }
}
