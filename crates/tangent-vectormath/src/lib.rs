//! SVD-based principal-component subtraction, antonym steering, cross-modal
//! bridge vectors, and cosine reranking (spec §4.4).
//!
//! Every public operation here returns an L2-normalized vector. All of it
//! is synchronous math except the embedding calls, which are the only
//! suspension points (spec §5).

mod bridge;
mod config;
mod math;
mod pca;
mod steering;

pub use bridge::DOMAIN_ANCHORS;
pub use config::VectorMathConfig;
pub use math::cosine_similarity;

use std::sync::Arc;

use tangent_clients::EmbeddingClient;
use tangent_core::SearchResult;
use tokio::sync::OnceCell;

/// The VectorMath component. Holds the process-wide write-once caches
/// (domain centroids, bridge vectors) described in spec §5 — constructed
/// once at startup and shared behind an `Arc` by every request.
pub struct VectorMath {
    embeddings: Arc<dyn EmbeddingClient>,
    config: VectorMathConfig,
    domain_centroids: OnceCell<std::collections::HashMap<String, Vec<f32>>>,
    bridge_vectors: OnceCell<std::collections::HashMap<(String, String), Vec<f32>>>,
}

impl VectorMath {
    pub fn new(embeddings: Arc<dyn EmbeddingClient>, config: VectorMathConfig) -> Self {
        Self {
            embeddings,
            config,
            domain_centroids: OnceCell::new(),
            bridge_vectors: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &VectorMathConfig {
        &self.config
    }

    async fn memory_embeddings(&self, memories: &[tangent_core::Memory]) -> anyhow::Result<Vec<Vec<f32>>> {
        if memories.is_empty() {
            return Ok(Vec::new());
        }
        let texts: Vec<String> = memories
            .iter()
            .map(|m| m.content.chars().take(2000).collect())
            .collect();
        self.embeddings.embed_batch(&texts).await
    }

    pub async fn principal_component_subtraction(
        &self,
        user_memories: &[tangent_core::Memory],
    ) -> anyhow::Result<(Vec<f32>, Vec<String>)> {
        let embeddings = self.memory_embeddings(user_memories).await?;
        pca::principal_component_subtraction(&embeddings, user_memories, &self.config)
    }

    pub async fn antonym_steering(
        &self,
        current_context: &str,
        user_memories: &[tangent_core::Memory],
        target_vibe: Option<String>,
    ) -> anyhow::Result<(Vec<f32>, String)> {
        let memory_embeddings = self.memory_embeddings(user_memories).await?;

        let truncated_context: String = current_context.chars().take(4000).collect();
        let v_context = self.embeddings.embed(&truncated_context).await?;

        let target_vibe = target_vibe.unwrap_or_else(|| {
            use rand::seq::SliceRandom;
            self.config
                .antonym_target_vibes
                .choose(&mut rand::thread_rng())
                .cloned()
                .unwrap_or_else(|| "cozy and intimate".to_string())
        });
        let v_target = self.embeddings.embed(&target_vibe).await?;

        Ok((
            steering::antonym_steering(&memory_embeddings, &v_context, &v_target, self.config.antonym_alpha),
            target_vibe,
        ))
    }

    async fn domain_centroids(&self) -> anyhow::Result<&std::collections::HashMap<String, Vec<f32>>> {
        self.domain_centroids
            .get_or_try_init(|| async {
                let mut centroids = std::collections::HashMap::new();
                for (domain, anchors) in DOMAIN_ANCHORS.iter() {
                    let texts: Vec<String> = anchors.iter().map(|s| s.to_string()).collect();
                    let embeddings = self.embeddings.embed_batch(&texts).await?;
                    centroids.insert(domain.to_string(), math::mean_vector(&embeddings));
                }
                Ok::<_, anyhow::Error>(centroids)
            })
            .await
    }

    async fn bridge_vectors(&self) -> anyhow::Result<&std::collections::HashMap<(String, String), Vec<f32>>> {
        if let Some(cached) = self.bridge_vectors.get() {
            return Ok(cached);
        }
        let centroids = self.domain_centroids().await?;
        let bridges = bridge::compute_bridge_vectors(centroids);
        let _ = self.bridge_vectors.set(bridges);
        Ok(self.bridge_vectors.get().expect("just set"))
    }

    pub async fn bridge_vector(
        &self,
        content: &str,
        source_domain: &str,
        target_domain: &str,
    ) -> anyhow::Result<Vec<f32>> {
        let bridges = self.bridge_vectors().await?;
        let truncated: String = content.chars().take(4000).collect();
        let v_content = self.embeddings.embed(&truncated).await?;

        match bridges.get(&(target_domain.to_string(), source_domain.to_string())) {
            Some(v_bridge) => Ok(math::normalize(&math::add(&v_content, v_bridge))),
            None => {
                tracing::warn!(source_domain, target_domain, "no bridge vector for domain pair");
                Ok(math::normalize(&v_content))
            }
        }
    }

    pub async fn rerank_by_vector(
        &self,
        results: Vec<SearchResult>,
        target_vector: &[f32],
        top_k: Option<usize>,
    ) -> anyhow::Result<Vec<SearchResult>> {
        let top_k = top_k.unwrap_or(self.config.rerank_top_k);
        if results.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = results
            .iter()
            .map(|r| {
                if r.text.is_empty() {
                    r.title.clone()
                } else {
                    r.text.chars().take(2000).collect()
                }
            })
            .collect();

        let embeddings = self.embeddings.embed_batch(&texts).await?;

        let mut scored: Vec<(SearchResult, f32)> = results
            .into_iter()
            .zip(embeddings.iter())
            .map(|(result, embedding)| {
                let similarity = math::cosine_similarity(embedding, target_vector);
                (result, similarity)
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);
        Ok(scored.into_iter().map(|(r, _)| r).collect())
    }
}
