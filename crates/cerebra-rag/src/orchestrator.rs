//! The answer orchestrator: compose retrieval, prompting, and generation,
//! fan out the "all strategies" request, and hand rows to the evaluator.

use std::sync::Arc;
use std::time::Duration;
use serde::Serialize;
use tokio::time::timeout;
use tracing::{info, instrument, warn};

use cerebra_common::{CerebraError, QueryRequest, Result};
use cerebra_providers::LlmProvider;

use crate::prompts;
use crate::retriever::{Retriever, Strategy};

/// One strategy's answer: the generated response plus the reranked
/// context it was grounded on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RagAnswer {
    pub response: String,
    pub response_status: u16,
    pub retrieved_context: String,
}

/// Outcome of one strategy inside `answer_all`. Failures stay per-strategy
/// so partial success is still a valid response.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StrategyOutcome {
    Answered(RagAnswer),
    Failed { error: String, strategy: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct AllAnswers {
    pub hybrid: StrategyOutcome,
    pub hyde: StrategyOutcome,
    pub dense: StrategyOutcome,
    pub sparse: StrategyOutcome,
}

pub struct RagOrchestrator {
    retriever: Arc<Retriever>,
    /// Answer model, already wrapped in the shared rate limiter.
    answer_llm: Arc<dyn LlmProvider>,
    strategy_timeout: Duration,
}

impl RagOrchestrator {
    pub fn new(
        retriever: Arc<Retriever>,
        answer_llm: Arc<dyn LlmProvider>,
        strategy_timeout: Duration,
    ) -> Self {
        Self { retriever, answer_llm, strategy_timeout }
    }

    /// Retrieve with one strategy, then generate. The LLM is always
    /// consulted: with empty context the prompt instructs it to refuse,
    /// so a miss degrades instead of erroring.
    #[instrument(skip(self, strategy, req), fields(strategy = strategy.as_str()))]
    pub async fn answer(
        &self,
        brain_id: &str,
        strategy: Strategy,
        req: &QueryRequest,
    ) -> Result<RagAnswer> {
        if req.query.trim().is_empty() {
            return Err(CerebraError::Invalid("query must not be empty".to_string()));
        }
        let pdf_ids = req.selected_ids();
        let retrieved = self.retriever.retrieve(brain_id, strategy, &req.query, &pdf_ids).await?;

        let prompt = prompts::answer_prompt(&req.query, &retrieved.combined);
        let response = self.answer_llm.complete(&prompt).await?;
        info!(context_chars = retrieved.combined.len(), "Response generated");

        Ok(RagAnswer {
            response,
            response_status: 200,
            retrieved_context: retrieved.combined,
        })
    }

    /// Run all four strategies concurrently, each under its own deadline.
    /// No strategy cancels another; the aggregator waits for all to settle.
    #[instrument(skip(self, req))]
    pub async fn answer_all(&self, brain_id: &str, req: &QueryRequest) -> AllAnswers {
        let (hybrid, hyde, dense, sparse) = tokio::join!(
            self.answer_bounded(brain_id, Strategy::Hybrid, req),
            self.answer_bounded(brain_id, Strategy::Hyde, req),
            self.answer_bounded(brain_id, Strategy::Dense, req),
            self.answer_bounded(brain_id, Strategy::Sparse, req),
        );
        AllAnswers { hybrid, hyde, dense, sparse }
    }

    async fn answer_bounded(
        &self,
        brain_id: &str,
        strategy: Strategy,
        req: &QueryRequest,
    ) -> StrategyOutcome {
        match timeout(self.strategy_timeout, self.answer(brain_id, strategy, req)).await {
            Ok(Ok(answer)) => StrategyOutcome::Answered(answer),
            Ok(Err(e)) => {
                warn!(strategy = strategy.as_str(), error = %e, "Strategy failed");
                StrategyOutcome::Failed {
                    error: e.to_string(),
                    strategy: strategy.as_str().to_string(),
                }
            }
            Err(_) => {
                warn!(strategy = strategy.as_str(), "Strategy timed out");
                StrategyOutcome::Failed {
                    error: "timeout".to_string(),
                    strategy: strategy.as_str().to_string(),
                }
            }
        }
    }
}
