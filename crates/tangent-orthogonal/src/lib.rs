//! Six serendipity strategies built on embedding arithmetic and LLM-guided
//! query rewriting (spec §4.5).
//!
//! Strategies 1-3 (noise injection, archetype bridge, cross-domain vibe)
//! rewrite the search query in natural language and issue a direct web
//! search. Strategies 4-6 (PCA, antonym, bridge) compute a target vector
//! with `tangent_vectormath`, issue a broad search, and rerank the pool
//! against that vector. Failures in any one strategy are isolated — they
//! never abort the others.

mod config;
mod result;

pub use config::OrthogonalConfig;
pub use result::{OrthogonalResult, OrthogonalStrategy};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rand::seq::SliceRandom;
use serde_json::{json, Value};
use tangent_clients::{CompletionRequest, LlmClient, SearchOptions, WebSearchClient};
use tangent_concepts::ConceptExtractor;
use tangent_core::{Memory, OrthogonalMetadata, SearchResult, VibeProfile};
use tangent_vectormath::{VectorMath, DOMAIN_ANCHORS};
use tracing::warn;

pub struct OrthogonalSearcher {
    llm: Arc<dyn LlmClient>,
    web: Arc<dyn WebSearchClient>,
    vector_math: Arc<VectorMath>,
    concepts: Arc<ConceptExtractor>,
    model: String,
    config: OrthogonalConfig,
}

impl OrthogonalSearcher {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        web: Arc<dyn WebSearchClient>,
        vector_math: Arc<VectorMath>,
        concepts: Arc<ConceptExtractor>,
        model: impl Into<String>,
        config: OrthogonalConfig,
    ) -> Self {
        Self { llm, web, vector_math, concepts, model: model.into(), config }
    }

    /// Strategy 1: perturb the query into a related-but-different
    /// semantic cluster and search directly.
    pub async fn search_with_noise(
        &self,
        query: &str,
        num_results: usize,
        noise_scale: Option<f32>,
    ) -> anyhow::Result<OrthogonalResult> {
        let scale = noise_scale.unwrap_or(self.config.noise_scale);
        let noisy_query = self.generate_noisy_query(query, scale).await;

        let results = self.web.search(&noisy_query, num_results, &SearchOptions::default()).await?;

        Ok(OrthogonalResult {
            items: results,
            strategy: OrthogonalStrategy::NoiseInjection,
            query_used: noisy_query,
            vibe_profile: None,
            target_domain: None,
            subtracted_tags: Vec::new(),
            target_vibe: None,
        })
    }

    /// Strategy 2: extract the archetype who values this content, then
    /// ask for a query in a different domain that archetype would love.
    pub async fn search_via_archetype(
        &self,
        context: &str,
        vibe: Option<VibeProfile>,
        target_domain: Option<String>,
        num_results: usize,
    ) -> anyhow::Result<OrthogonalResult> {
        let vibe = match vibe {
            Some(v) => v,
            None => self.concepts.extract_vibe(context).await,
        };

        if vibe.archetype.is_empty() {
            let mut empty = OrthogonalResult::empty(OrthogonalStrategy::ArchetypeBridge);
            empty.vibe_profile = Some(vibe);
            return Ok(empty);
        }

        let target_domain = target_domain.unwrap_or_else(|| {
            let available: Vec<&String> = self
                .config
                .target_domains
                .iter()
                .filter(|d| d.to_lowercase() != vibe.source_domain.to_lowercase())
                .collect();
            available
                .choose(&mut rand::thread_rng())
                .map(|d| d.to_string())
                .unwrap_or_else(|| "experiences".to_string())
        });

        let bridge_query = self.generate_archetype_query(&vibe, &target_domain).await;
        let results = self.web.search(&bridge_query, num_results, &SearchOptions::default()).await?;

        Ok(OrthogonalResult {
            items: results,
            strategy: OrthogonalStrategy::ArchetypeBridge,
            query_used: bridge_query,
            vibe_profile: Some(vibe),
            target_domain: Some(target_domain),
            subtracted_tags: Vec::new(),
            target_vibe: None,
        })
    }

    /// Strategy 3: use a random cross-domain interest from the vibe
    /// profile verbatim as the search query.
    pub async fn search_cross_domain(&self, vibe: &VibeProfile, num_results: usize) -> anyhow::Result<OrthogonalResult> {
        if vibe.cross_domain_interests.is_empty() {
            let mut empty = OrthogonalResult::empty(OrthogonalStrategy::CrossDomain);
            empty.vibe_profile = Some(vibe.clone());
            return Ok(empty);
        }

        let interest = vibe
            .cross_domain_interests
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default();

        let results = self.web.search(&interest, num_results, &SearchOptions::default()).await?;

        Ok(OrthogonalResult {
            items: results,
            strategy: OrthogonalStrategy::CrossDomain,
            query_used: interest,
            vibe_profile: Some(vibe.clone()),
            target_domain: None,
            subtracted_tags: Vec::new(),
            target_vibe: None,
        })
    }

    /// Strategy 4: subtract the user's dominant taste axis, describe what
    /// remains, search broadly for that description, then rerank against
    /// the math vector.
    pub async fn search_pca(
        &self,
        user_memories: &[Memory],
        vibe: Option<&VibeProfile>,
        num_results: usize,
    ) -> anyhow::Result<OrthogonalResult> {
        let (vector, subtracted_tags) = self.vector_math.principal_component_subtraction(user_memories).await?;
        if vector.is_empty() {
            return Ok(OrthogonalResult::empty(OrthogonalStrategy::PcaSearch));
        }

        let description = self.describe_pca_vector(vibe, &subtracted_tags).await;
        let pool_size = self.vector_math.config().rerank_pool_size;
        let pool = self.web.search(&description, pool_size, &SearchOptions::default()).await?;
        let reranked = self.vector_math.rerank_by_vector(pool, &vector, Some(num_results)).await?;

        Ok(OrthogonalResult {
            items: reranked,
            strategy: OrthogonalStrategy::PcaSearch,
            query_used: description,
            vibe_profile: vibe.cloned(),
            target_domain: None,
            subtracted_tags,
            target_vibe: None,
        })
    }

    /// Strategy 5: steer away from the user's recent context toward a
    /// target vibe, search broadly for that vibe label, then rerank.
    pub async fn search_antonym(
        &self,
        current_context: &str,
        user_memories: &[Memory],
        target_vibe: Option<String>,
        num_results: usize,
    ) -> anyhow::Result<OrthogonalResult> {
        let (vector, target_vibe_label) =
            self.vector_math.antonym_steering(current_context, user_memories, target_vibe).await?;

        let pool_size = self.vector_math.config().rerank_pool_size;
        let pool = self.web.search(&target_vibe_label, pool_size, &SearchOptions::default()).await?;
        let reranked = self.vector_math.rerank_by_vector(pool, &vector, Some(num_results)).await?;

        Ok(OrthogonalResult {
            items: reranked,
            strategy: OrthogonalStrategy::AntonymSearch,
            query_used: target_vibe_label.clone(),
            vibe_profile: None,
            target_domain: None,
            subtracted_tags: Vec::new(),
            target_vibe: Some(target_vibe_label),
        })
    }

    /// Strategy 6: bridge the content's vector from the source domain to
    /// a target domain, search broadly keyed on that domain plus a
    /// handful of emotional signatures, then rerank.
    pub async fn search_bridge(
        &self,
        content: &str,
        vibe: &VibeProfile,
        target_domain: Option<String>,
        num_results: usize,
    ) -> anyhow::Result<OrthogonalResult> {
        let source_domain = if vibe.source_domain.is_empty() { "general" } else { vibe.source_domain.as_str() };

        let target_domain = target_domain.unwrap_or_else(|| {
            let available: Vec<&str> = DOMAIN_ANCHORS
                .iter()
                .map(|(domain, _)| *domain)
                .filter(|d| !d.eq_ignore_ascii_case(source_domain))
                .collect();
            available
                .choose(&mut rand::thread_rng())
                .map(|d| d.to_string())
                .unwrap_or_else(|| "experiences".to_string())
        });

        let vector = self.vector_math.bridge_vector(content, source_domain, &target_domain).await?;

        let signatures: Vec<&String> = vibe.emotional_signatures.iter().take(3).collect();
        let query = if signatures.is_empty() {
            target_domain.clone()
        } else {
            let joined = signatures.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" ");
            format!("{target_domain} {joined}")
        };

        let pool_size = self.vector_math.config().rerank_pool_size;
        let pool = self.web.search(&query, pool_size, &SearchOptions::default()).await?;
        let reranked = self.vector_math.rerank_by_vector(pool, &vector, Some(num_results)).await?;

        Ok(OrthogonalResult {
            items: reranked,
            strategy: OrthogonalStrategy::BridgeSearch,
            query_used: query,
            vibe_profile: Some(vibe.clone()),
            target_domain: Some(target_domain),
            subtracted_tags: Vec::new(),
            target_vibe: None,
        })
    }

    /// Dispatches strategies 1-3 unconditionally and 4-6 whenever the
    /// caller has a user-memory set large enough for the math to be
    /// meaningful (mirrors `pca_min_memories`, the threshold PCA itself
    /// already falls back on). Every strategy runs concurrently; a
    /// failure in one is logged and excluded, never propagated.
    pub async fn search_all_strategies(
        &self,
        context: &str,
        original_query: &str,
        user_memories: &[Memory],
        num_results_per_strategy: usize,
    ) -> Vec<OrthogonalResult> {
        let vibe = self.concepts.extract_vibe(context).await;

        type BoxedFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<OrthogonalResult>> + Send + 'a>>;
        let mut tasks: Vec<BoxedFuture> = vec![
            Box::pin(self.search_with_noise(original_query, num_results_per_strategy, None)),
            Box::pin(self.search_via_archetype(context, Some(vibe.clone()), None, num_results_per_strategy)),
            Box::pin(self.search_cross_domain(&vibe, num_results_per_strategy)),
        ];

        if user_memories.len() >= self.vector_math.config().pca_min_memories {
            tasks.push(Box::pin(self.search_pca(user_memories, Some(&vibe), num_results_per_strategy)));
            tasks.push(Box::pin(self.search_antonym(context, user_memories, None, num_results_per_strategy)));
            tasks.push(Box::pin(self.search_bridge(context, &vibe, None, num_results_per_strategy)));
        }

        let outcomes = futures::future::join_all(tasks).await;

        outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                Ok(result) => Some(result),
                Err(err) => {
                    warn!(error = %err, "orthogonal strategy failed, excluding from results");
                    None
                }
            })
            .collect()
    }

    /// Generates a search query for the archetype-bridge strategy: one
    /// this archetype would love, set in `target_domain`. Structured
    /// output with a plain-text heuristic fallback.
    async fn generate_archetype_query(&self, vibe: &VibeProfile, target_domain: &str) -> String {
        let system_prompt = "You generate a short web search query (5-12 words) for a specific domain that would satisfy the kind of person described. Return only the query.";
        let user_prompt = format!(
            "Archetype: {}\nEmotional signatures: {}\nTarget domain: {target_domain}",
            vibe.archetype,
            vibe.emotional_signatures.join(", ")
        );

        let request = CompletionRequest::single_turn(&self.model, system_prompt, user_prompt)
            .with_temperature(0.8)
            .with_max_tokens(40);

        match self.llm.complete_structured(&request, &archetype_query_schema()).await {
            Ok(value) => value
                .get("query")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("{target_domain} like {}", vibe.archetype)),
            Err(err) => {
                warn!(error = %err, "archetype query generation failed, using heuristic fallback");
                format!("{target_domain} like {}", vibe.archetype)
            }
        }
    }

    /// Describes, in search-engine terms, what the PCA-subtracted
    /// direction "feels like" given the vibe and the names of the
    /// memories that defined the subtracted axes.
    async fn describe_pca_vector(&self, vibe: Option<&VibeProfile>, subtracted_tags: &[String]) -> String {
        if subtracted_tags.is_empty() {
            return vibe
                .map(|v| v.emotional_signatures.join(" "))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "something unexpected and adjacent".to_string());
        }

        let system_prompt = "Given a description of what someone's usual interests are (to avoid) and their aesthetic vibe, describe in 5-12 searchable words what they might enjoy instead — something adjacent but not their usual obsession. Return only the phrase.";
        let user_prompt = format!(
            "Usual obsessions (avoid these): {}\nVibe: {}",
            subtracted_tags.join("; "),
            vibe.map(|v| v.archetype.as_str()).unwrap_or("unknown")
        );

        let request = CompletionRequest::single_turn(&self.model, system_prompt, user_prompt)
            .with_temperature(0.8)
            .with_max_tokens(40);

        match self.llm.complete_structured(&request, &feeling_schema()).await {
            Ok(value) => value
                .get("feeling")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "something unexpected and adjacent".to_string()),
            Err(err) => {
                warn!(error = %err, "PCA vector description failed, using fallback phrase");
                "something unexpected and adjacent".to_string()
            }
        }
    }

    /// Generates a semantically adjacent-but-different rephrasing of
    /// `query`. The higher `noise_scale`, the further the deviation and
    /// the higher the sampling temperature (mirrors `_generate_noisy_query`).
    async fn generate_noisy_query(&self, query: &str, noise_scale: f32) -> String {
        let deviation = if noise_scale < 0.15 {
            "slightly rephrase with a different angle, keeping the core topic"
        } else if noise_scale < 0.25 {
            "shift to a related but distinct concept that shares underlying principles"
        } else {
            "make an unexpected lateral leap to a tangentially connected idea"
        };

        let system_prompt =
            format!("Modify this search query to land in a RELATED but DIFFERENT semantic cluster. {deviation}. Return ONLY 5-15 searchable words, no explanation.");
        let user_prompt = format!("Original query: {query}");

        let request = CompletionRequest::single_turn(&self.model, system_prompt, user_prompt)
            .with_temperature(0.8 + noise_scale * 0.5)
            .with_max_tokens(30);

        match self.llm.complete(&request).await {
            Ok(response) => {
                let trimmed = response.content.trim().trim_matches('"');
                if trimmed.is_empty() { query.to_string() } else { trimmed.to_string() }
            }
            Err(err) => {
                warn!(error = %err, "noisy query generation failed, reusing original query");
                query.to_string()
            }
        }
    }

    /// Round-robin interleaves every strategy's items up to `max_total`,
    /// aggregating provenance into an `OrthogonalMetadata`.
    pub fn combine_results(&self, results: &[OrthogonalResult], max_total: usize) -> (Vec<SearchResult>, OrthogonalMetadata) {
        combine_results(results, max_total)
    }
}

fn archetype_query_schema() -> Value {
    json!({
        "name": "archetype_query",
        "schema": {
            "type": "object",
            "properties": { "query": { "type": "string" } },
            "required": ["query"],
            "additionalProperties": false
        }
    })
}

fn feeling_schema() -> Value {
    json!({
        "name": "pca_feeling",
        "schema": {
            "type": "object",
            "properties": { "feeling": { "type": "string" } },
            "required": ["feeling"],
            "additionalProperties": false
        }
    })
}

/// Free function so it can be unit tested without constructing a full
/// `OrthogonalSearcher` (which needs live collaborators).
pub fn combine_results(results: &[OrthogonalResult], max_total: usize) -> (Vec<SearchResult>, OrthogonalMetadata) {
    let mut metadata = OrthogonalMetadata::default();
    for result in results {
        metadata.strategies_used.push(result.strategy.as_core_strategy());
        metadata.queries_used.push(result.query_used.clone());
        metadata.subtracted_tags.extend(result.subtracted_tags.iter().cloned());
        if metadata.target_vibe.is_none() {
            metadata.target_vibe = result.target_vibe.clone();
        }
    }

    let mut combined = Vec::new();
    let mut indices = vec![0usize; results.len()];
    loop {
        if combined.len() >= max_total {
            break;
        }
        let mut added_any = false;
        for (i, result) in results.iter().enumerate() {
            if combined.len() >= max_total {
                break;
            }
            if indices[i] < result.items.len() {
                combined.push(result.items[indices[i]].clone());
                indices[i] += 1;
                added_any = true;
            }
        }
        if !added_any {
            break;
        }
    }

    (combined, metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tangent_core::Strategy;

    fn result_with_items(strategy: OrthogonalStrategy, urls: &[&str]) -> OrthogonalResult {
        let mut r = OrthogonalResult::empty(strategy);
        r.items = urls
            .iter()
            .map(|u| SearchResult { title: u.to_string(), url: u.to_string(), text: String::new(), score: 1.0, published_date: None })
            .collect();
        r
    }

    #[test]
    fn combine_results_round_robins_across_strategies() {
        let a = result_with_items(OrthogonalStrategy::NoiseInjection, &["a1", "a2", "a3"]);
        let b = result_with_items(OrthogonalStrategy::CrossDomain, &["b1"]);

        let (combined, metadata) = combine_results(&[a, b], 6);

        let urls: Vec<&str> = combined.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["a1", "b1", "a2", "a3"]);
        assert_eq!(metadata.strategies_used, vec![Strategy::Orthogonal, Strategy::Orthogonal]);
    }

    #[test]
    fn combine_results_respects_max_total() {
        let a = result_with_items(OrthogonalStrategy::NoiseInjection, &["a1", "a2", "a3", "a4"]);
        let (combined, _) = combine_results(&[a], 2);
        assert_eq!(combined.len(), 2);
    }

    #[test]
    fn combine_results_empty_input_is_empty() {
        let (combined, metadata) = combine_results(&[], 5);
        assert!(combined.is_empty());
        assert!(metadata.strategies_used.is_empty());
    }

    #[test]
    fn combine_results_aggregates_subtracted_tags_and_target_vibe() {
        let mut pca = result_with_items(OrthogonalStrategy::PcaSearch, &["p1"]);
        pca.subtracted_tags = vec!["cyberpunk anime".to_string()];
        let mut antonym = result_with_items(OrthogonalStrategy::AntonymSearch, &["an1"]);
        antonym.target_vibe = Some("cozy and intimate".to_string());

        let (_, metadata) = combine_results(&[pca, antonym], 10);

        assert_eq!(metadata.subtracted_tags, vec!["cyberpunk anime".to_string()]);
        assert_eq!(metadata.target_vibe, Some("cozy and intimate".to_string()));
        assert_eq!(metadata.strategies_used, vec![Strategy::Pca, Strategy::Antonym]);
    }

    #[test]
    fn orthogonal_strategy_maps_to_expected_core_strategy() {
        assert_eq!(OrthogonalStrategy::NoiseInjection.as_core_strategy(), Strategy::Orthogonal);
        assert_eq!(OrthogonalStrategy::ArchetypeBridge.as_core_strategy(), Strategy::Orthogonal);
        assert_eq!(OrthogonalStrategy::CrossDomain.as_core_strategy(), Strategy::Orthogonal);
        assert_eq!(OrthogonalStrategy::PcaSearch.as_core_strategy(), Strategy::Pca);
        assert_eq!(OrthogonalStrategy::AntonymSearch.as_core_strategy(), Strategy::Antonym);
        assert_eq!(OrthogonalStrategy::BridgeSearch.as_core_strategy(), Strategy::Bridge);
    }
}
