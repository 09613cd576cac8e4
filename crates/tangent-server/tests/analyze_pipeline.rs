//! End-to-end exercise of the `/analyze` and `/health` routes against
//! hand-rolled fakes for all four external collaborators, in place of a
//! mocking framework — matching
//! `original_source/backend/tests/conftest.py`'s fakes-over-mocks style
//! (SPEC_FULL.md §A.4).

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use tangent_clients::{
    CompletionRequest, CompletionResponse, EmbeddingClient, LlmClient, MemoryStoreClient, SearchOptions,
    WebSearchClient,
};
use tangent_concepts::ConceptExtractor;
use tangent_core::{EdgeKind, Memory, RelatedMemory, SearchResult};
use tangent_judge::ContextJudge;
use tangent_logger::DecisionLogger;
use tangent_orthogonal::OrthogonalSearcher;
use tangent_router::CascadeRouter;
use tangent_scorer::Scorer;
use tangent_server::controller::AnalyzeController;
use tangent_server::state::AppState;
use tangent_server::{build_router, Config};
use tangent_vectormath::VectorMath;

/// Always answers with a fixed tangential-concepts array for
/// `complete`, and a minimal valid payload for `complete_structured`
/// keyed off which schema name the caller asked for.
struct FakeLlmClient;

#[async_trait]
impl LlmClient for FakeLlmClient {
    async fn complete(&self, _request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
        Ok(CompletionResponse {
            content: r#"["tactical philosophy origins", "youth academy systems", "counter-pressing theory"]"#
                .to_string(),
        })
    }

    async fn complete_structured(&self, _request: &CompletionRequest, schema: &Value) -> anyhow::Result<Value> {
        match schema.get("name").and_then(Value::as_str) {
            Some("main_subject") => Ok(serde_json::json!({"subject": "football tactics"})),
            Some("strategy_weights") => Ok(serde_json::json!({
                "serendipity": 0.6,
                "relevance": 0.5,
                "source_web": 0.5,
                "source_local": 0.5,
                "reasoning": "balanced exploratory reading"
            })),
            Some("vibe_profile") => Ok(serde_json::json!({
                "emotional_signatures": ["focused", "analytical"],
                "archetype": "a tactics nerd who annotates match footage",
                "cross_domain_interests": ["chess openings", "urban planning"],
                "anti_patterns": ["hot takes"],
                "source_domain": "sports"
            })),
            _ => Ok(serde_json::json!({
                "title": "A tangent worth chasing",
                "body": "Related reading synthesized from the fake collaborator.",
                "reasoning": "plausible connection"
            })),
        }
    }
}

/// Returns a fixed-dimension deterministic embedding so cosine similarity
/// and PCA math have something stable to chew on.
struct FakeEmbeddingClient;

#[async_trait]
impl EmbeddingClient for FakeEmbeddingClient {
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let seed = (text.len() as f32 + i as f32) * 0.013;
                vec![seed.sin(), seed.cos(), (seed * 1.7).sin(), (seed * 0.6).cos()]
            })
            .collect())
    }
}

struct FakeWebSearchClient;

#[async_trait]
impl WebSearchClient for FakeWebSearchClient {
    async fn search(&self, query: &str, num_results: usize, _options: &SearchOptions) -> anyhow::Result<Vec<SearchResult>> {
        Ok((0..num_results.min(3))
            .map(|i| SearchResult {
                title: format!("{query} result {i}"),
                url: format!("https://example.com/{query}/{i}"),
                text: "a web page about something tangential".to_string(),
                score: 0.8,
                published_date: None,
            })
            .collect())
    }

    async fn find_similar(&self, url: &str, num_results: usize) -> anyhow::Result<Vec<SearchResult>> {
        self.search(url, num_results, &SearchOptions::default()).await
    }

    async fn get_contents(&self, urls: &[String]) -> anyhow::Result<Vec<SearchResult>> {
        Ok(urls
            .iter()
            .map(|url| SearchResult {
                title: "Fetched page".to_string(),
                url: url.clone(),
                text: "fetched page content".to_string(),
                score: 1.0,
                published_date: None,
            })
            .collect())
    }
}

/// Carries a small fixed set of memories so graph-pivot and vector
/// fetches have something to return.
struct FakeMemoryStoreClient {
    memories: Vec<Memory>,
}

impl FakeMemoryStoreClient {
    fn new() -> Self {
        let memories = (0..6)
            .map(|i| Memory {
                id: format!("mem-{i}"),
                content: format!("a past note about topic {i}"),
                similarity: Some(0.5 + (i as f32) * 0.05),
                created_at: None,
                last_accessed: Some(chrono::Utc::now() - chrono::Duration::days(10 + i as i64)),
                relationships: Vec::new(),
            })
            .collect();
        Self { memories }
    }
}

#[async_trait]
impl MemoryStoreClient for FakeMemoryStoreClient {
    async fn search(&self, _query: &str, limit: usize) -> anyhow::Result<Vec<Memory>> {
        Ok(self.memories.iter().take(limit).cloned().collect())
    }

    async fn get_memory(&self, id: &str) -> anyhow::Result<Option<Memory>> {
        Ok(self.memories.iter().find(|m| m.id == id).cloned())
    }

    async fn get_related(&self, _id: &str, _edge_kinds: &[EdgeKind]) -> anyhow::Result<Vec<RelatedMemory>> {
        Ok(Vec::new())
    }

    async fn add_memory(
        &self,
        _content: &str,
        _container_tag: Option<&str>,
        _metadata: Option<Value>,
        _custom_id: Option<&str>,
    ) -> anyhow::Result<String> {
        Ok("new-memory-id".to_string())
    }

    async fn list_memories(&self, limit: usize) -> anyhow::Result<Vec<Memory>> {
        self.search("", limit).await
    }

    async fn get_profile(&self) -> anyhow::Result<Value> {
        Ok(serde_json::json!({}))
    }

    async fn search_documents(&self, query: &str, limit: usize) -> anyhow::Result<Vec<Memory>> {
        self.search(query, limit).await
    }
}

fn test_config(log_path: &std::path::Path) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        openai_api_key: "unused".to_string(),
        openai_base_url: "https://unused.invalid".to_string(),
        openai_model: "fake-model".to_string(),
        embedding_base_url: "https://unused.invalid".to_string(),
        embedding_model: "fake-embedding-model".to_string(),
        exa_api_key: "unused".to_string(),
        exa_base_url: "https://unused.invalid".to_string(),
        supermemory_api_key: "unused".to_string(),
        supermemory_base_url: "https://unused.invalid".to_string(),
        max_anchors: 5,
        min_similarity_threshold: 0.65,
        max_similarity_threshold: 0.85,
        max_suggestions: 3,
        base_fetch_count: 10,
        orthogonal_enabled: true,
        orthogonal_noise_scale: 0.15,
        orthogonal_target_domains: vec!["restaurant".to_string(), "movie".to_string()],
        orthogonal_vibe_temperature: 0.8,
        pca_lambda_surprise: 1.0,
        pca_min_memories: 5,
        pca_num_components: 2,
        antonym_alpha: 0.5,
        antonym_target_vibes: vec!["cozy and intimate".to_string()],
        rerank_pool_size: 50,
        rerank_top_k: 5,
        judge_log_path: log_path.to_string_lossy().to_string(),
        rate_limit_requests_per_minute: 100,
    }
}

/// Each test gets its own decision-log file (held open for the test's
/// duration via the returned `TempDir`) so concurrently-run tests never
/// interleave writes to the same path.
fn build_test_state() -> (AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("decisions.jsonl");
    let config = Arc::new(test_config(&log_path));

    let llm: Arc<dyn LlmClient> = Arc::new(FakeLlmClient);
    let embeddings: Arc<dyn EmbeddingClient> = Arc::new(FakeEmbeddingClient);
    let web: Arc<dyn WebSearchClient> = Arc::new(FakeWebSearchClient);
    let memory: Arc<dyn MemoryStoreClient> = Arc::new(FakeMemoryStoreClient::new());

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

    let state = AppState { config, llm, embeddings, web, memory, concepts, judge, vector_math, orthogonal, router, scorer, logger, controller };
    (state, dir)
}

#[tokio::test]
async fn health_reports_ok() {
    let (state, _dir) = build_test_state();
    let app = build_router(state);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "tangent");
}

#[tokio::test]
async fn analyze_returns_suggestions_for_a_tangential_context() {
    let (state, _dir) = build_test_state();
    let app = build_router(state);

    let payload = serde_json::json!({
        "context": "Pep Guardiola — Wikipedia. A Spanish football manager known for positional play.",
        "appName": "Safari",
        "windowTitle": "Pep Guardiola - Wikipedia"
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/analyze")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();

    assert!(json["suggestions"].is_array());
    assert!(json["retrievalPath"].is_string());
    assert!(json["confidence"].is_string());
}

#[tokio::test]
async fn feedback_rejects_unrecognized_signal() {
    let (state, _dir) = build_test_state();
    let app = build_router(state);

    let payload = serde_json::json!({
        "requestId": "abc12345",
        "insightId": "some-id",
        "signal": "not_a_real_signal"
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/feedback")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
