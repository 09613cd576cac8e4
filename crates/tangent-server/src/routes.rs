//! Route handlers for the HTTP surface (spec §6, plus the `/metrics`
//! route SPEC_FULL.md §A.5 adds to it).
//!
//! Each diagnostic `/test-*` handler runs exactly one pipeline component
//! in isolation and returns its raw output, per SPEC_FULL.md §B.4 — they
//! exist so the two non-shipped routing modes (plain cascade,
//! orthogonal-only) and the individual extractor/judge stages stay
//! reachable without being wired into `/analyze`.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;

use tangent_clients::SearchOptions;
use tangent_core::{CascadeResult, Item};

use crate::dto::{
    AnalyzeRequest, AnalyzeResponse, FeedbackRequest, HealthResponse, SaveToMemoryRequest, SaveToMemoryResponse,
    SearchWebQuery, StatusResponse, FEEDBACK_SIGNALS,
};
use crate::error::{ApiError, ApiResult};
use crate::metrics::metrics_handler;
use crate::state::AppState;

/// Grounded in `main.py`'s canned default contexts for the `/test-*`
/// routes when no context is supplied (spec §8 scenario 1's paragraph).
const DEFAULT_TANGENTIAL_CONTEXT: &str =
    "Pep Guardiola — Wikipedia. Josep \"Pep\" Guardiola Sala is a Spanish professional \
football manager and former player, currently manager of Premier League club Manchester \
City.";

/// Grounded in `main.py`'s wabi-sabi default context for `/test-vibe`.
const DEFAULT_VIBE_CONTEXT: &str =
    "The tea bowl sat slightly uneven on the shelf, its glaze cracked in a way that caught \
the afternoon light. There was nothing to fix here — the imperfection was the point, a \
quiet argument against the idea that beauty requires symmetry.";

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .route("/analyze", post(analyze))
        .route("/search-web", post(search_web))
        .route("/save-to-memory", post(save_to_memory))
        .route("/feedback", post(feedback))
        .route("/test-exa", post(test_exa))
        .route("/test-tangential", post(test_tangential))
        .route("/test-vibe", post(test_vibe))
        .route("/test-orthogonal", post(test_orthogonal))
        .route("/test-context-judge", post(test_context_judge))
        .route("/test-memory", get(test_memory))
        .with_state(Arc::new(state))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", service: "tangent" })
}

async fn analyze(State(state): State<Arc<AppState>>, Json(req): Json<AnalyzeRequest>) -> Json<AnalyzeResponse> {
    let response = state.controller.analyze(&req.context, &req.app_name, &req.window_title).await;
    Json(response)
}

async fn search_web(State(state): State<Arc<AppState>>, Query(q): Query<SearchWebQuery>) -> ApiResult<Json<AnalyzeResponse>> {
    if q.query.trim().is_empty() {
        return Err(ApiError::Validation("query must not be blank".to_string()));
    }

    let results = state
        .web
        .search(&q.query, 5, &SearchOptions::default())
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    let scored = state
        .scorer
        .filter_and_rank(&results.into_iter().map(Item::Web).collect::<Vec<_>>(), state.config.max_suggestions);

    let mut suggestions = Vec::with_capacity(scored.len());
    for item in &scored {
        let suggestion = tangent_synth::synthesize(
            state.llm.as_ref(),
            &state.config.openai_model,
            &item.item,
            &q.query,
            item.relevance,
            item.novelty,
            tangent_core::SuggestionSource::Web,
        )
        .await;
        suggestions.push(suggestion);
    }

    Ok(Json(AnalyzeResponse {
        suggestions,
        processing_time_ms: 0,
        retrieval_path: Some("web".to_string()),
        confidence: Some("medium".to_string()),
        graph_insight: false,
        should_offer_web: false,
    }))
}

async fn save_to_memory(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveToMemoryRequest>,
) -> ApiResult<Json<SaveToMemoryResponse>> {
    if req.title.trim().is_empty() || req.content.trim().is_empty() {
        return Err(ApiError::Validation("title and content must not be blank".to_string()));
    }

    let mut metadata = serde_json::json!({"title": req.title});
    if let Some(source_url) = &req.source_url {
        metadata["sourceUrl"] = serde_json::json!(source_url);
    }
    if let Some(context) = &req.context {
        metadata["context"] = serde_json::json!(context);
    }

    match state.memory.add_memory(&req.content, Some("tangent"), Some(metadata), None).await {
        Ok(memory_id) => {
            Ok(Json(SaveToMemoryResponse { status: "saved", memory_id: Some(memory_id), title: Some(req.title) }))
        }
        Err(err) => {
            tracing::warn!(error = %err, "save-to-memory failed");
            Err(ApiError::Internal(err.to_string()))
        }
    }
}

async fn feedback(State(state): State<Arc<AppState>>, Json(req): Json<FeedbackRequest>) -> ApiResult<Json<StatusResponse>> {
    if !FEEDBACK_SIGNALS.contains(&req.signal.as_str()) {
        return Err(ApiError::Validation(format!("unrecognized feedback signal: {}", req.signal)));
    }

    state
        .logger
        .log_feedback(&req.request_id, &req.insight_id, &req.signal, req.dwell_time_ms, req.position, req.metadata)
        .await;

    Ok(Json(StatusResponse { status: "recorded" }))
}

#[derive(Debug, serde::Deserialize)]
struct OptionalQuery {
    #[serde(default)]
    query: Option<String>,
}

async fn test_exa(State(state): State<Arc<AppState>>, Query(q): Query<OptionalQuery>) -> ApiResult<Json<Value>> {
    let query = q.query.unwrap_or_else(|| "serendipitous discovery".to_string());
    let results = state
        .web
        .search(&query, 5, &SearchOptions::default())
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    // "More like this" affordance (SPEC_FULL.md §B.3): find_similar never
    // feeds the core /analyze response, only this diagnostic.
    let similar = match results.first() {
        Some(top) => state.web.find_similar(&top.url, 3).await.unwrap_or_default(),
        None => Vec::new(),
    };

    Ok(Json(serde_json::json!({"query": query, "results": results, "moreLikeTop": similar})))
}

#[derive(Debug, serde::Deserialize, Default)]
struct OptionalContext {
    #[serde(default)]
    context: Option<String>,
}

async fn test_tangential(State(state): State<Arc<AppState>>, body: Option<Json<OptionalContext>>) -> Json<Value> {
    let context = body
        .and_then(|Json(b)| b.context)
        .unwrap_or_else(|| DEFAULT_TANGENTIAL_CONTEXT.to_string());
    let main_subject = state.concepts.extract_main_subject(&context).await;
    let concepts = state.concepts.extract_concepts(&context, "Safari").await;

    Json(serde_json::json!({"mainSubject": main_subject, "tangentialConcepts": concepts}))
}

async fn test_vibe(State(state): State<Arc<AppState>>, body: Option<Json<OptionalContext>>) -> Json<Value> {
    let context = body.and_then(|Json(b)| b.context).unwrap_or_else(|| DEFAULT_VIBE_CONTEXT.to_string());
    let vibe = state.concepts.extract_vibe(&context).await;
    Json(serde_json::to_value(vibe).unwrap_or(Value::Null))
}

async fn test_orthogonal(State(state): State<Arc<AppState>>, body: Option<Json<OptionalContext>>) -> Json<Value> {
    let context = body
        .and_then(|Json(b)| b.context)
        .unwrap_or_else(|| DEFAULT_TANGENTIAL_CONTEXT.to_string());
    let concepts = state.concepts.extract_concepts(&context, "Safari").await;
    let query = concepts.iter().take(3).cloned().collect::<Vec<_>>().join(" ");

    let cascade = state.router.route_orthogonal_only(&context, &query).await;
    Json(cascade_result_to_json(&cascade))
}

async fn test_context_judge(
    State(state): State<Arc<AppState>>,
    body: Option<Json<ContextJudgeBody>>,
) -> Json<Value> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let context = body.context.unwrap_or_else(|| DEFAULT_TANGENTIAL_CONTEXT.to_string());
    let app_name = body.app_name.unwrap_or_else(|| "Safari".to_string());
    let window_title = body.window_title.unwrap_or_default();

    let weights = state.judge.analyze(&context, &app_name, &window_title).await;
    Json(serde_json::to_value(weights).unwrap_or(Value::Null))
}

/// Offline memory-health check (SPEC_FULL.md §B.2): the profile and a
/// sample of recent memories, neither of which the core `/analyze`
/// pipeline ever needs — `get_profile`/`list_memories` exist purely for
/// this kind of diagnostic/offline use.
async fn test_memory(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let profile = state.memory.get_profile().await.map_err(|err| ApiError::Internal(err.to_string()))?;
    let recent = state.memory.list_memories(10).await.map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(Json(serde_json::json!({"profile": profile, "recentMemoryCount": recent.len()})))
}

#[derive(Debug, serde::Deserialize, Default)]
struct ContextJudgeBody {
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    app_name: Option<String>,
    #[serde(default)]
    window_title: Option<String>,
}

/// `CascadeResult` isn't itself `Serialize` (its `Item` enum's inner
/// types are, but the router-internal wrapper fields aren't meant for
/// the wire) — this assembles the diagnostic-friendly JSON view by hand.
#[derive(Serialize)]
struct CascadeResultView<'a> {
    path: &'static str,
    confidence: &'static str,
    graph_insight: bool,
    should_offer_web: bool,
    item_count: usize,
    items: &'a [Item],
    orthogonal: Option<&'a tangent_core::OrthogonalMetadata>,
}

fn cascade_result_to_json(cascade: &CascadeResult) -> Value {
    let view = CascadeResultView {
        path: cascade.path.as_str(),
        confidence: cascade.confidence.as_str(),
        graph_insight: cascade.graph_insight,
        should_offer_web: cascade.should_offer_web,
        item_count: cascade.items.len(),
        items: &cascade.items,
        orthogonal: cascade.orthogonal.as_ref(),
    };
    serde_json::to_value(view).unwrap_or(Value::Null)
}
