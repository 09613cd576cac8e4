use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of relationship an edge in the memory graph carries.
///
/// Mirrors the edge vocabulary the original Supermemory-backed graph
/// exposes: derives/extends/contrast/updates, plus the "child_" variants
/// used when the edge points at a child document rather than a sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Extends,
    Updates,
    Derives,
    Contrast,
    ChildExtends,
    ChildUpdates,
    ChildDerives,
}

/// A related memory reached by traversing one edge from an anchor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedMemory {
    pub memory: Memory,
    pub edge_kind: EdgeKind,
}

/// A unit of long-term user knowledge, owned by the external memory
/// store. The core only ever holds transient copies scoped to a single
/// request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    pub id: String,
    pub content: String,
    /// Populated only when this memory came back from a search; absent
    /// for memories reached via graph traversal alone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub relationships: Vec<RelatedMemory>,
}

impl Memory {
    pub fn similarity_or_zero(&self) -> f32 {
        self.similarity.unwrap_or(0.0)
    }

    pub fn fingerprint(&self) -> &str {
        match self.content.char_indices().nth(100) {
            Some((byte_offset, _)) => &self.content[..byte_offset],
            None => &self.content,
        }
    }
}

/// A unit of web knowledge, owned transiently by the process handling a
/// single request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub text: String,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
}

impl SearchResult {
    pub fn fingerprint(&self) -> &str {
        &self.url
    }
}
