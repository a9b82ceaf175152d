//! Shared application state: the runtime context built once at boot and
//! injected into every handler. No global singletons.

use std::sync::Arc;
use std::time::Duration;

use cerebra_config::{Config, EvaluationConfig};
use cerebra_ingestion::{BrainCatalog, IngestionPipeline, LopdfChunker};
use cerebra_providers::{
    ChatCompletionsLlm, EmbeddingProvider, LlmProvider, RemoteEmbeddings, RerankerProvider,
    RewardClient, RewardModel, TeiReranker, ThrottledLlm,
};
use cerebra_rag::{BatchEvaluator, Evaluator, RagOrchestrator, Retriever};
use cerebra_vectorstore::qdrant_http::QdrantHttpConfig;
use cerebra_vectorstore::{QdrantHttpStore, VectorStore};

pub struct AppState {
    pub catalog: Arc<BrainCatalog>,
    pub pipeline: Arc<IngestionPipeline>,
    pub orchestrator: Arc<RagOrchestrator>,
    pub evaluator: Arc<Evaluator>,
    pub batch: Arc<BatchEvaluator>,
    pub evaluation: EvaluationConfig,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Build the production context: Qdrant store, remote providers, and
    /// the rate-limited answer model. Creates the registry collection.
    pub async fn from_config(cfg: Config) -> anyhow::Result<Self> {
        let store: Arc<dyn VectorStore> = Arc::new(QdrantHttpStore::new(QdrantHttpConfig {
            base_url: cfg.vector_store.url.clone(),
            timeout: Duration::from_secs(cfg.vector_store.timeout_secs),
            upsert_retries: cfg.vector_store.upsert_retries,
        })?);

        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(RemoteEmbeddings::new(
            cfg.embedding.dense.clone(),
            cfg.embedding.sparse.clone(),
        )?);
        let reranker: Arc<dyn RerankerProvider> = Arc::new(TeiReranker::new(cfg.reranker.clone())?);

        let answer_llm: Arc<dyn LlmProvider> = Arc::new(ThrottledLlm::new(
            Arc::new(ChatCompletionsLlm::new(cfg.llm.answer.clone())?),
            cfg.limits.answer_rpm,
        ));
        let instruct_llm: Arc<dyn LlmProvider> =
            Arc::new(ChatCompletionsLlm::new(cfg.llm.instruct.clone())?);
        let reward: Arc<dyn RewardModel> = Arc::new(RewardClient::new(cfg.llm.reward.clone())?);

        let chunker = Arc::new(LopdfChunker::default());

        let state = Self::from_parts(
            store,
            embedder,
            reranker,
            answer_llm.clone(),
            answer_llm,
            instruct_llm,
            reward,
            chunker,
            &cfg,
        );
        state.catalog.ensure_registry().await?;
        Ok(state)
    }

    /// Assemble the context from capability objects. Tests inject fakes
    /// here; production goes through `from_config`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        reranker: Arc<dyn RerankerProvider>,
        answer_llm: Arc<dyn LlmProvider>,
        hyde_llm: Arc<dyn LlmProvider>,
        instruct_llm: Arc<dyn LlmProvider>,
        reward: Arc<dyn RewardModel>,
        chunker: Arc<dyn cerebra_ingestion::Chunker>,
        cfg: &Config,
    ) -> Self {
        let catalog = Arc::new(BrainCatalog::new(
            store.clone(),
            cfg.vector_store.registry_collection.clone(),
            cfg.embedding.dense.dim,
        ));
        let pipeline = Arc::new(IngestionPipeline::new(
            catalog.clone(),
            store.clone(),
            embedder.clone(),
            chunker,
        ));
        let retriever = Arc::new(Retriever::new(
            store,
            embedder,
            reranker,
            hyde_llm,
            cfg.reranker.top_k,
            cfg.reranker.candidate_limit,
        ));
        let orchestrator = Arc::new(RagOrchestrator::new(
            retriever,
            answer_llm,
            Duration::from_secs(cfg.limits.strategy_timeout_secs),
        ));
        let evaluator = Arc::new(Evaluator::new(instruct_llm, reward));
        let batch = Arc::new(BatchEvaluator::new(orchestrator.clone(), evaluator.clone()));

        Self {
            catalog,
            pipeline,
            orchestrator,
            evaluator,
            batch,
            evaluation: cfg.evaluation.clone(),
        }
    }
}
