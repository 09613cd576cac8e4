use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which strategy family a `Suggestion` traces back to (spec §3: `source
/// tag ∈ {local, web, orthogonal}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    /// Drawn from the user's own long-term memory store.
    Local,
    /// Drawn from a plain web search.
    Web,
    /// Cross-domain serendipitous discovery.
    Orthogonal,
}

/// A result assembled and handed back to the caller of `/analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: String,
    pub title: String,
    pub content: String,
    pub reasoning: String,
    pub source: SuggestionSource,
    pub relevance_score: f32,
    pub novelty_score: f32,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl Suggestion {
    pub fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Implicit and explicit feedback signals a client can report back
/// against a suggestion it previously received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    Click,
    Dwell,
    Dismiss,
    ScrollPast,
    ThumbsUp,
    ThumbsDown,
    Save,
}
