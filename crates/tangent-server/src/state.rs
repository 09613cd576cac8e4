//! Shared application state: every vendor client and pipeline component,
//! constructed once at startup and cloned cheaply (everything expensive
//! lives behind an `Arc`) into each request handler.

use std::sync::Arc;

use tangent_clients::{
    EmbeddingClient, ExaWebSearchClient, HttpEmbeddingClient, LlmClient, MemoryStoreClient, OpenAiLlmClient,
    SupermemoryClient, WebSearchClient,
};
use tangent_concepts::ConceptExtractor;
use tangent_judge::ContextJudge;
use tangent_logger::DecisionLogger;
use tangent_orthogonal::OrthogonalSearcher;
use tangent_router::CascadeRouter;
use tangent_scorer::Scorer;
use tangent_vectormath::VectorMath;

use crate::config::Config;
use crate::controller::AnalyzeController;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub llm: Arc<dyn LlmClient>,
    pub embeddings: Arc<dyn EmbeddingClient>,
    pub web: Arc<dyn WebSearchClient>,
    pub memory: Arc<dyn MemoryStoreClient>,
    pub concepts: Arc<ConceptExtractor>,
    pub judge: Arc<ContextJudge>,
    pub vector_math: Arc<VectorMath>,
    pub orthogonal: Arc<OrthogonalSearcher>,
    pub router: Arc<CascadeRouter>,
    pub scorer: Arc<Scorer>,
    pub logger: Arc<DecisionLogger>,
    pub controller: Arc<AnalyzeController>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        let llm: Arc<dyn LlmClient> =
            Arc::new(OpenAiLlmClient::new(config.openai_base_url.clone(), config.openai_api_key.clone()));
        let embeddings: Arc<dyn EmbeddingClient> = Arc::new(HttpEmbeddingClient::new(
            config.embedding_base_url.clone(),
            config.openai_api_key.clone(),
            config.embedding_model.clone(),
        ));
        let web: Arc<dyn WebSearchClient> = Arc::new(ExaWebSearchClient::new(config.exa_base_url.clone(), config.exa_api_key.clone()));
        let memory: Arc<dyn MemoryStoreClient> =
            Arc::new(SupermemoryClient::new(config.supermemory_base_url.clone(), config.supermemory_api_key.clone()));

        let concepts = Arc::new(ConceptExtractor::new(llm.clone(), config.openai_model.clone()));
        let judge = Arc::new(ContextJudge::new(llm.clone(), config.openai_model.clone()));
        let vector_math = Arc::new(VectorMath::new(embeddings.clone(), config.vectormath_config()));
        let orthogonal = Arc::new(OrthogonalSearcher::new(
            llm.clone(),
            web.clone(),
            vector_math.clone(),
            concepts.clone(),
            config.openai_model.clone(),
            config.orthogonal_config(),
        ));
        let scorer = Arc::new(Scorer::new(config.scorer_config()));
        let router = Arc::new(CascadeRouter::new(
            memory.clone(),
            web.clone(),
            orthogonal.clone(),
            Scorer::new(config.scorer_config()),
            config.router_config(),
        ));
        let logger = Arc::new(DecisionLogger::new(config.judge_log_path.clone()));

        let controller = Arc::new(AnalyzeController::new(
            llm.clone(),
            web.clone(),
            concepts.clone(),
            judge.clone(),
            router.clone(),
            scorer.clone(),
            logger.clone(),
            config.openai_model.clone(),
            config.max_suggestions,
        ));

        Self { config, llm, embeddings, web, memory, concepts, judge, vector_math, orthogonal, router, scorer, logger, controller }
    }
}
