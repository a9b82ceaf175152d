//! cerebra-providers — Capability traits for the model backends
//! (embeddings, cross-encoder reranking, answer/instruct/reward LLMs)
//! and their HTTP implementations.

pub mod embedding;
pub mod llm;
pub mod reranker;
pub mod throttle;

pub use embedding::{EmbeddingError, EmbeddingProvider, RemoteEmbeddings};
pub use llm::{ChatCompletionsLlm, LlmError, LlmProvider, RewardClient, RewardModel};
pub use reranker::{RankedDoc, RerankError, RerankerProvider, TeiReranker};
pub use throttle::ThrottledLlm;
