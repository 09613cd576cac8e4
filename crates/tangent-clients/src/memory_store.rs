use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tangent_core::{EdgeKind, Memory, RelatedMemory};
use tracing::warn;

use crate::error::ClientError;

/// The long-term memory store. A blank `query` in `search` is a
/// deliberate, documented probe — it asks for the most recent memories
/// rather than a semantic match, used by strategies that need a
/// content-agnostic sample of the user's taste (PCA/antonym/bridge
/// search, and `route_weighted`'s local-vector fetch when no sharper
/// query is available).
#[async_trait]
pub trait MemoryStoreClient: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> anyhow::Result<Vec<Memory>>;

    async fn get_memory(&self, id: &str) -> anyhow::Result<Option<Memory>>;

    async fn get_related(&self, id: &str, edge_kinds: &[EdgeKind]) -> anyhow::Result<Vec<RelatedMemory>>;

    async fn add_memory(
        &self,
        content: &str,
        container_tag: Option<&str>,
        metadata: Option<Value>,
        custom_id: Option<&str>,
    ) -> anyhow::Result<String>;

    /// Best-effort, supplemental operations (SPEC_FULL.md §B.2) — used by
    /// diagnostics/offline tooling, never by `/analyze`.
    async fn list_memories(&self, limit: usize) -> anyhow::Result<Vec<Memory>>;

    async fn get_profile(&self) -> anyhow::Result<Value>;

    async fn search_documents(&self, query: &str, limit: usize) -> anyhow::Result<Vec<Memory>>;
}

#[derive(Debug, Deserialize)]
struct RawEdge {
    #[serde(rename = "type")]
    kind: String,
    memory: RawMemory,
}

#[derive(Debug, Deserialize)]
struct RawMemory {
    id: String,
    content: String,
    similarity: Option<f32>,
    #[serde(rename = "createdAt")]
    created_at: Option<DateTime<Utc>>,
    #[serde(rename = "lastAccessed")]
    last_accessed: Option<DateTime<Utc>>,
    #[serde(default)]
    relationships: Vec<RawEdge>,
}

fn parse_edge_kind(raw: &str) -> Option<EdgeKind> {
    match raw {
        "extends" => Some(EdgeKind::Extends),
        "updates" => Some(EdgeKind::Updates),
        "derives" => Some(EdgeKind::Derives),
        "contrast" => Some(EdgeKind::Contrast),
        "child_extends" => Some(EdgeKind::ChildExtends),
        "child_updates" => Some(EdgeKind::ChildUpdates),
        "child_derives" => Some(EdgeKind::ChildDerives),
        other => {
            warn!(edge_kind = other, "unrecognized memory edge kind, dropping edge");
            None
        }
    }
}

impl From<RawMemory> for Memory {
    fn from(raw: RawMemory) -> Self {
        let relationships = raw
            .relationships
            .into_iter()
            .filter_map(|edge| {
                parse_edge_kind(&edge.kind).map(|edge_kind| RelatedMemory {
                    memory: edge.memory.into(),
                    edge_kind,
                })
            })
            .collect();

        Memory {
            id: raw.id,
            content: raw.content,
            similarity: raw.similarity,
            created_at: raw.created_at,
            last_accessed: raw.last_accessed,
            relationships,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RawMemory>,
}

#[derive(Debug, Deserialize)]
struct RelatedResponse {
    #[serde(default)]
    related: Vec<RawEdge>,
}

#[derive(Debug, Deserialize)]
struct AddMemoryResponse {
    id: String,
}

pub struct SupermemoryClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupermemoryClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn post<T: for<'de> Deserialize<'de>>(&self, path: &str, body: Value) -> anyhow::Result<T> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(ClientError::Status { status, body });
        }

        response
            .json()
            .await
            .map_err(|err| ClientError::Decode(err.to_string()).into())
    }
}

#[async_trait]
impl MemoryStoreClient for SupermemoryClient {
    async fn search(&self, query: &str, limit: usize) -> anyhow::Result<Vec<Memory>> {
        // An empty query is intentionally forwarded as-is: the API
        // interprets it as "most recent memories" rather than erroring.
        let response: SearchResponse = self
            .post("/search", serde_json::json!({"q": query, "limit": limit}))
            .await?;

        Ok(response.results.into_iter().map(Into::into).collect())
    }

    async fn get_memory(&self, id: &str) -> anyhow::Result<Option<Memory>> {
        let response = self
            .client
            .get(format!("{}/memories/{}", self.base_url, id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(ClientError::Status { status, body });
        }

        let raw: RawMemory = response
            .json()
            .await
            .map_err(|err| ClientError::Decode(err.to_string()))?;
        Ok(Some(raw.into()))
    }

    async fn get_related(&self, id: &str, edge_kinds: &[EdgeKind]) -> anyhow::Result<Vec<RelatedMemory>> {
        let kinds: Vec<&'static str> = edge_kinds
            .iter()
            .map(|k| match k {
                EdgeKind::Extends => "extends",
                EdgeKind::Updates => "updates",
                EdgeKind::Derives => "derives",
                EdgeKind::Contrast => "contrast",
                EdgeKind::ChildExtends => "child_extends",
                EdgeKind::ChildUpdates => "child_updates",
                EdgeKind::ChildDerives => "child_derives",
            })
            .collect();

        let response: RelatedResponse = self
            .post(
                &format!("/memories/{id}/related"),
                serde_json::json!({"relationshipTypes": kinds}),
            )
            .await?;

        Ok(response
            .related
            .into_iter()
            .filter_map(|edge| {
                parse_edge_kind(&edge.kind).map(|edge_kind| RelatedMemory {
                    memory: edge.memory.into(),
                    edge_kind,
                })
            })
            .collect())
    }

    async fn add_memory(
        &self,
        content: &str,
        container_tag: Option<&str>,
        metadata: Option<Value>,
        custom_id: Option<&str>,
    ) -> anyhow::Result<String> {
        let mut body = serde_json::json!({"content": content});
        if let Some(tag) = container_tag {
            body["containerTag"] = serde_json::json!(tag);
        }
        if let Some(metadata) = metadata {
            body["metadata"] = metadata;
        }
        if let Some(custom_id) = custom_id {
            body["customId"] = serde_json::json!(custom_id);
        }

        let response: AddMemoryResponse = self.post("/memories", body).await?;
        Ok(response.id)
    }

    async fn list_memories(&self, limit: usize) -> anyhow::Result<Vec<Memory>> {
        let response: SearchResponse = self
            .post("/memories/list", serde_json::json!({"limit": limit}))
            .await?;
        Ok(response.results.into_iter().map(Into::into).collect())
    }

    async fn get_profile(&self) -> anyhow::Result<Value> {
        self.post("/profile", serde_json::json!({})).await
    }

    async fn search_documents(&self, query: &str, limit: usize) -> anyhow::Result<Vec<Memory>> {
        let response: SearchResponse = self
            .post("/documents/search", serde_json::json!({"q": query, "limit": limit}))
            .await?;
        Ok(response.results.into_iter().map(Into::into).collect())
    }
}
