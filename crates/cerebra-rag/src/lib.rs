//! cerebra-rag — Retrieval strategies, the answer orchestrator, and the
//! offline evaluator.

pub mod batch;
pub mod evaluator;
pub mod orchestrator;
pub mod prompts;
pub mod retriever;

pub use batch::BatchEvaluator;
pub use evaluator::{parse_scores, EvalScores, Evaluator};
pub use orchestrator::{AllAnswers, RagAnswer, RagOrchestrator, StrategyOutcome};
pub use retriever::{RetrievedContext, Retriever, Strategy};
