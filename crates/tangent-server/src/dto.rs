//! Wire-level request/response shapes for the HTTP surface (spec §6).
//! camelCase on the wire; snake_case in Rust, via `serde(rename_all)`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tangent_core::Suggestion;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub app_name: String,
    #[serde(default)]
    pub window_title: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub suggestions: Vec<Suggestion>,
    pub processing_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieval_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    pub graph_insight: bool,
    pub should_offer_web: bool,
}

impl AnalyzeResponse {
    pub fn empty(processing_time_ms: u64) -> Self {
        Self {
            suggestions: Vec::new(),
            processing_time_ms,
            retrieval_path: None,
            confidence: None,
            graph_insight: false,
            should_offer_web: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchWebQuery {
    pub query: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveToMemoryRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveToMemoryResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Known feedback signals (spec §4.9). Kept as a plain string on the
/// wire and validated in the handler rather than a `#[serde(tag)]` enum,
/// so an unrecognized signal produces a clean 422 instead of a generic
/// deserialization error.
pub const FEEDBACK_SIGNALS: &[&str] =
    &["click", "dwell", "dismiss", "scroll_past", "thumbs_up", "thumbs_down", "save"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub request_id: String,
    pub insight_id: String,
    pub signal: String,
    #[serde(default)]
    pub dwell_time_ms: Option<u64>,
    #[serde(default)]
    pub position: Option<usize>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}
