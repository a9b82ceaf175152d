//! Reward-model evaluation of answers and retrieved context.
//!
//! The reward model returns a score line of the form
//! `helpfulness:X,correctness:X,coherence:X,complexity:X,verbosity:X`
//! with X in [0, 4] (never asserted, only parsed). A missing ground truth
//! is synthesised by the instruct model first.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use cerebra_providers::{LlmProvider, RewardModel};

use crate::prompts;

/// Context longer than this (whitespace tokens) is truncated before the
/// reward call so the exchange stays inside the model's window.
const MAX_CONTEXT_TOKENS: usize = 1400;

/// Raw score strings per target; `None` when the reward call failed, in
/// which case the caller records the row as skipped.
#[derive(Debug, Clone)]
pub struct EvalScores {
    pub llm: Option<String>,
    pub retriever: Option<String>,
}

pub struct Evaluator {
    instruct: Arc<dyn LlmProvider>,
    reward: Arc<dyn RewardModel>,
}

impl Evaluator {
    pub fn new(instruct: Arc<dyn LlmProvider>, reward: Arc<dyn RewardModel>) -> Self {
        Self { instruct, reward }
    }

    /// Score a `(context, question, answer)` triple against a ground
    /// truth, synthesising the ground truth when absent. Reward failures
    /// degrade to `None` per target; they never abort the caller.
    #[instrument(skip_all, fields(question))]
    pub async fn evaluate(
        &self,
        context: &str,
        question: &str,
        answer: &str,
        ground_truth: Option<&str>,
    ) -> EvalScores {
        let ground_truth = match ground_truth.filter(|gt| !gt.trim().is_empty()) {
            Some(gt) => gt.to_string(),
            None => match self.instruct.complete(&prompts::ground_truth_prompt(question)).await {
                Ok(gt) => gt,
                Err(e) => {
                    warn!(error = %e, "Ground truth synthesis failed, scoring without one");
                    String::new()
                }
            },
        };

        let cleaned = clean_and_truncate(context, MAX_CONTEXT_TOKENS);

        let llm = match self
            .reward
            .score(&prompts::llm_eval_prompt(question, &cleaned, &ground_truth), answer)
            .await
        {
            Ok(s) => Some(s),
            Err(e) => {
                warn!(error = %e, "LLM reward call failed");
                None
            }
        };

        let retriever = match self
            .reward
            .score(&prompts::retriever_eval_prompt(question, &ground_truth), &cleaned)
            .await
        {
            Ok(s) => Some(s),
            Err(e) => {
                warn!(error = %e, "Retriever reward call failed");
                None
            }
        };

        info!(llm_scored = llm.is_some(), retriever_scored = retriever.is_some(), "Row evaluated");
        EvalScores { llm, retriever }
    }
}

/// Collapse whitespace, then keep at most `max_tokens` whitespace-separated
/// tokens.
pub fn clean_and_truncate(text: &str, max_tokens: usize) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() > max_tokens {
        tokens[..max_tokens].join(" ")
    } else {
        tokens.join(" ")
    }
}

/// Parse a `k:v,k:v,…` score line into a metric map. Unparseable entries
/// are dropped rather than failing the row.
pub fn parse_scores(raw: &str) -> HashMap<String, f32> {
    raw.split(',')
        .filter_map(|item| {
            let (key, value) = item.split_once(':')?;
            let value: f32 = value.trim().parse().ok()?;
            Some((key.trim().to_lowercase(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scores_reads_the_reward_line() {
        let scores =
            parse_scores("helpfulness:3.5,correctness:3.8,coherence:3.6,complexity:2.1,verbosity:1.9");
        assert_eq!(scores.len(), 5);
        assert_eq!(scores["helpfulness"], 3.5);
        assert_eq!(scores["verbosity"], 1.9);
    }

    #[test]
    fn parse_scores_tolerates_garbage_entries() {
        let scores = parse_scores("helpfulness:3.5,notanumber:x,,justtext");
        assert_eq!(scores.len(), 1);
        assert_eq!(scores["helpfulness"], 3.5);
    }

    #[test]
    fn truncation_collapses_whitespace_and_caps_tokens() {
        let text = "a  b\tc\nd e";
        assert_eq!(clean_and_truncate(text, 10), "a b c d e");
        assert_eq!(clean_and_truncate(text, 3), "a b c");
    }
}
