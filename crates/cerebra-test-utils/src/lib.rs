//! cerebra-test-utils — Deterministic in-memory fakes for the remote
//! capabilities: vector store, embeddings, reranker, LLMs, reward model,
//! and chunker. Everything here is seedless and order-stable so property
//! tests can assert exact outputs.

pub mod chunker;
pub mod embeddings;
pub mod llm;
pub mod reranker;
pub mod store;

pub use chunker::StaticChunker;
pub use embeddings::FakeEmbeddings;
pub use llm::{ScriptedLlm, ScriptedReward};
pub use reranker::OverlapReranker;
pub use store::InMemoryVectorStore;
