//! CascadeRouter: orchestrates retrieval under three routing modes (spec
//! §4.6) — legacy cascade (`route`), orthogonal-only (`route_orthogonal_only`),
//! and weighted allocation (`route_weighted`, the only mode actually
//! shipped behind `/analyze`; the other two back the `/test-*` diagnostic
//! endpoints).
//!
//! Graph pivot is the central idea borrowed from the legacy cascade: a
//! memory too similar to the query (the "echo chamber") is redundant to
//! show directly, but its graph neighbors — what it derives from, extends,
//! or contrasts with — are exactly the kind of adjacent-but-new content
//! worth surfacing.

mod config;

pub use config::RouterConfig;

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tangent_clients::{MemoryStoreClient, SearchOptions, WebSearchClient};
use tangent_core::{
    CascadeResult, Confidence, EdgeKind, Item, Memory, OrthogonalMetadata, RetrievalPath, ScoredCandidate, SearchResult,
    Source, Strategy, StrategyWeights, VibeProfile,
};
use tangent_orthogonal::OrthogonalSearcher;
use tangent_scorer::Scorer;

/// Graph pivot neighbor kinds considered when pivoting off an echo-chamber
/// anchor, or surfacing a sweet-spot anchor's own graph connections.
const PIVOT_EDGE_KINDS: [EdgeKind; 3] = [EdgeKind::Derives, EdgeKind::Extends, EdgeKind::Contrast];

struct OrthogonalCombined {
    items: Vec<SearchResult>,
    metadata: OrthogonalMetadata,
    vibe: Option<VibeProfile>,
}

pub struct CascadeRouter {
    memory: Arc<dyn MemoryStoreClient>,
    web: Arc<dyn WebSearchClient>,
    orthogonal: Arc<OrthogonalSearcher>,
    scorer: Scorer,
    config: RouterConfig,
}

impl CascadeRouter {
    pub fn new(
        memory: Arc<dyn MemoryStoreClient>,
        web: Arc<dyn WebSearchClient>,
        orthogonal: Arc<OrthogonalSearcher>,
        scorer: Scorer,
        config: RouterConfig,
    ) -> Self {
        Self { memory, web, orthogonal, scorer, config }
    }

    /// Legacy cascade: orthogonal (if enabled) → graph pivot → vector →
    /// web. Retained for the `/test-*` diagnostic surface; `/analyze`
    /// itself uses `route_weighted`.
    pub async fn route(&self, query: &str, context: &str, force_web: bool, enable_orthogonal: bool) -> CascadeResult {
        if enable_orthogonal {
            if let Some(orthogonal) = self.check_orthogonal(context, query).await {
                if !orthogonal.items.is_empty() {
                    if let Some(graph_items) = self.check_graph(query).await {
                        let mut combined: Vec<Item> =
                            orthogonal.items.iter().take(2).cloned().map(Item::Web).collect();
                        combined.extend(graph_items.into_iter().take(2));
                        return CascadeResult {
                            items: combined,
                            path: RetrievalPath::OrthogonalPlusGraph,
                            confidence: Confidence::High,
                            graph_insight: true,
                            should_offer_web: false,
                            orthogonal: Some(orthogonal.metadata),
                            vibe: orthogonal.vibe,
                            item_sources: Vec::new(),
                            item_strategies: Vec::new(),
                        };
                    }

                    return CascadeResult {
                        items: orthogonal.items.into_iter().map(Item::Web).collect(),
                        path: RetrievalPath::Orthogonal,
                        confidence: Confidence::Medium,
                        graph_insight: false,
                        should_offer_web: false,
                        orthogonal: Some(orthogonal.metadata),
                        vibe: orthogonal.vibe,
                        item_sources: Vec::new(),
                        item_strategies: Vec::new(),
                    };
                }
            }
        }

        if let Some(graph_items) = self.check_graph(query).await {
            if force_web {
                let web_results = self.web.search(query, 2, &SearchOptions::default()).await.unwrap_or_default();
                let mut combined = graph_items;
                combined.extend(web_results.into_iter().map(Item::Web));
                return CascadeResult {
                    items: combined,
                    path: RetrievalPath::GraphPlusWeb,
                    confidence: Confidence::High,
                    graph_insight: true,
                    should_offer_web: false,
                    orthogonal: None,
                    vibe: None,
                    item_sources: Vec::new(),
                    item_strategies: Vec::new(),
                };
            }

            return CascadeResult {
                items: graph_items,
                path: RetrievalPath::Graph,
                confidence: Confidence::High,
                graph_insight: true,
                should_offer_web: false,
                orthogonal: None,
                vibe: None,
                item_sources: Vec::new(),
                item_strategies: Vec::new(),
            };
        }

        let (vector_items, confidence) = self.check_vector(query).await;
        match confidence {
            Confidence::High => CascadeResult {
                items: vector_items,
                path: RetrievalPath::Vector,
                confidence,
                graph_insight: false,
                should_offer_web: false,
                orthogonal: None,
                vibe: None,
                item_sources: Vec::new(),
                item_strategies: Vec::new(),
            },
            Confidence::Medium => CascadeResult {
                items: vector_items,
                path: RetrievalPath::Vector,
                confidence,
                graph_insight: false,
                should_offer_web: true,
                orthogonal: None,
                vibe: None,
                item_sources: Vec::new(),
                item_strategies: Vec::new(),
            },
            Confidence::Low => {
                let web_results = self.web.search(query, 5, &SearchOptions::default()).await.unwrap_or_default();
                if vector_items.is_empty() {
                    CascadeResult {
                        items: web_results.into_iter().map(Item::Web).collect(),
                        path: RetrievalPath::Web,
                        confidence,
                        graph_insight: false,
                        should_offer_web: false,
                        orthogonal: None,
                        vibe: None,
                        item_sources: Vec::new(),
                        item_strategies: Vec::new(),
                    }
                } else {
                    let mut combined = vector_items;
                    combined.extend(web_results.into_iter().map(Item::Web));
                    CascadeResult {
                        items: combined,
                        path: RetrievalPath::VectorPlusWeb,
                        confidence,
                        graph_insight: false,
                        should_offer_web: false,
                        orthogonal: None,
                        vibe: None,
                        item_sources: Vec::new(),
                        item_strategies: Vec::new(),
                    }
                }
            }
        }
    }

    /// Routes using only the six orthogonal strategies; falls back to a
    /// plain web search when they yield nothing. Backs `/test-orthogonal`.
    pub async fn route_orthogonal_only(&self, context: &str, query: &str) -> CascadeResult {
        if let Some(result) = self.check_orthogonal(context, query).await {
            if !result.items.is_empty() {
                return CascadeResult {
                    items: result.items.into_iter().map(Item::Web).collect(),
                    path: RetrievalPath::Orthogonal,
                    confidence: Confidence::Medium,
                    graph_insight: false,
                    should_offer_web: false,
                    orthogonal: Some(result.metadata),
                    vibe: result.vibe,
                    item_sources: Vec::new(),
                    item_strategies: Vec::new(),
                };
            }
        }

        let web_results = self.web.search(query, 5, &SearchOptions::default()).await.unwrap_or_default();
        CascadeResult {
            items: web_results.into_iter().map(Item::Web).collect(),
            path: RetrievalPath::Web,
            confidence: Confidence::Low,
            graph_insight: false,
            should_offer_web: false,
            orthogonal: None,
            vibe: None,
            item_sources: Vec::new(),
            item_strategies: Vec::new(),
        }
    }

    /// The shipped routing mode: weights determine HOW MANY results to
    /// fetch per strategy and HOW MUCH to boost each one's score, never a
    /// binary on/off switch.
    pub async fn route_weighted(&self, query: &str, context: &str, weights: &StrategyWeights) -> CascadeResult {
        let base = self.config.base_fetch_count as f32;
        let limit_web = if weights.source_web > 0.1 { ((base * weights.source_web) as usize).max(1) } else { 0 };
        let limit_local = if weights.source_local > 0.1 { ((base * weights.source_local) as usize).max(1) } else { 0 };

        type BoxedFut<'a> = Pin<Box<dyn Future<Output = Vec<ScoredCandidate>> + Send + 'a>>;
        let mut tasks: Vec<BoxedFut> = Vec::new();

        if weights.serendipity > 0.2 {
            let limit = (limit_web + limit_local).min(3);
            tasks.push(Box::pin(self.fetch_orthogonal(query, context, limit)));
        }
        if limit_local > 0 {
            tasks.push(Box::pin(self.fetch_local(query, limit_local)));
        }
        if limit_web > 0 {
            tasks.push(Box::pin(self.fetch_web(query, limit_web)));
        }

        if tasks.is_empty() {
            return empty_weighted_result();
        }

        let mut candidates: Vec<ScoredCandidate> = futures::future::join_all(tasks).await.into_iter().flatten().collect();
        if candidates.is_empty() {
            return empty_weighted_result();
        }

        for candidate in candidates.iter_mut() {
            apply_weight_boost(candidate, weights);
        }
        candidates.sort_by(|a, b| b.adjusted_score.total_cmp(&a.adjusted_score));

        let mut seen = HashSet::new();
        let unique: Vec<ScoredCandidate> =
            candidates.into_iter().filter(|c| seen.insert(c.item.fingerprint().to_string())).collect();

        let top: Vec<ScoredCandidate> = unique.into_iter().take(self.config.max_suggestions).collect();

        let confidence = if top.is_empty() {
            Confidence::Low
        } else {
            let avg = top.iter().map(|c| c.adjusted_score).sum::<f32>() / top.len() as f32;
            if avg > 1.5 {
                Confidence::High
            } else if avg > 1.0 {
                Confidence::Medium
            } else {
                Confidence::Low
            }
        };

        let item_sources: Vec<Source> = top.iter().map(|c| c.source).collect();
        let item_strategies: Vec<Strategy> = top.iter().map(|c| c.strategy).collect();
        CascadeResult {
            items: top.into_iter().map(|c| c.item).collect(),
            path: RetrievalPath::Weighted,
            confidence,
            graph_insight: false,
            should_offer_web: false,
            orthogonal: None,
            vibe: None,
            item_sources,
            item_strategies,
        }
    }

    /// Explicit web search trigger for the "Search Web" button.
    pub async fn trigger_web_search(&self, query: &str) -> anyhow::Result<Vec<SearchResult>> {
        self.web.search(query, 5, &SearchOptions::default()).await
    }

    async fn fetch_orthogonal(&self, query: &str, context: &str, limit: usize) -> Vec<ScoredCandidate> {
        let user_memories = self.memory.search("", 20).await.unwrap_or_default();
        let per_strategy = (limit / 3).max(1);
        let results = self.orthogonal.search_all_strategies(context, query, &user_memories, per_strategy).await;

        if results.is_empty() {
            return Vec::new();
        }

        // Round-robin interleave preserving each item's originating
        // strategy, so downstream weight-boosting can tell a PCA/antonym/
        // bridge hit from a plain noise-injected one.
        let mut indices = vec![0usize; results.len()];
        let mut candidates = Vec::new();
        loop {
            if candidates.len() >= limit {
                break;
            }
            let mut added_any = false;
            for (i, result) in results.iter().enumerate() {
                if candidates.len() >= limit {
                    break;
                }
                if indices[i] < result.items.len() {
                    let item = result.items[indices[i]].clone();
                    indices[i] += 1;
                    added_any = true;
                    let score = item.score;
                    candidates.push(ScoredCandidate {
                        item: Item::Web(item),
                        source: Source::Web,
                        strategy: result.strategy.as_core_strategy(),
                        raw_score: score,
                        adjusted_score: score,
                    });
                }
            }
            if !added_any {
                break;
            }
        }
        candidates
    }

    async fn fetch_local(&self, query: &str, limit: usize) -> Vec<ScoredCandidate> {
        self.memory
            .search(query, limit)
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|memory| {
                let score = memory.similarity_or_zero();
                ScoredCandidate { item: Item::Memory(memory), source: Source::Local, strategy: Strategy::Vector, raw_score: score, adjusted_score: score }
            })
            .collect()
    }

    async fn fetch_web(&self, query: &str, limit: usize) -> Vec<ScoredCandidate> {
        self.web
            .search(query, limit, &SearchOptions::default())
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|result| {
                let score = result.score;
                ScoredCandidate { item: Item::Web(result), source: Source::Web, strategy: Strategy::Vector, raw_score: score, adjusted_score: score }
            })
            .collect()
    }

    /// Graph pivot: find anchors, bucket by similarity, pivot echo-chamber
    /// anchors to their graph neighbors, keep sweet-spot anchors directly,
    /// then MMR-rank the union. Returns `None` when nothing qualifies.
    async fn check_graph(&self, query: &str) -> Option<Vec<Item>> {
        let anchors = self.memory.search(query, self.config.max_anchors).await.ok()?;
        if anchors.is_empty() {
            return None;
        }

        let echo_chamber: Vec<&Memory> =
            anchors.iter().filter(|a| a.similarity_or_zero() >= self.config.max_similarity_threshold).collect();
        let sweet_spot: Vec<Memory> = anchors
            .iter()
            .filter(|a| {
                let sim = a.similarity_or_zero();
                sim >= self.config.min_similarity_threshold && sim < self.config.max_similarity_threshold
            })
            .cloned()
            .collect();

        let mut neighbors: Vec<Memory> = Vec::new();
        for anchor in echo_chamber.iter().take(3) {
            if let Ok(related) = self.memory.get_related(&anchor.id, &PIVOT_EDGE_KINDS).await {
                neighbors.extend(related.into_iter().map(|r| r.memory));
            }
        }
        for anchor in &sweet_spot {
            if !anchor.relationships.is_empty() {
                if let Ok(related) = self.memory.get_related(&anchor.id, &PIVOT_EDGE_KINDS).await {
                    neighbors.extend(related.into_iter().map(|r| r.memory));
                }
            }
        }

        let mut all_candidates = sweet_spot;
        all_candidates.extend(neighbors);
        if all_candidates.is_empty() {
            return None;
        }

        let mut seen = HashSet::new();
        let unique: Vec<Memory> = all_candidates.into_iter().filter(|m| seen.insert(m.id.clone())).collect();
        if unique.is_empty() {
            return None;
        }

        let items: Vec<Item> = unique.into_iter().map(Item::Memory).collect();
        let scored = self.scorer.filter_and_rank(&items, self.config.max_suggestions);
        if scored.is_empty() {
            None
        } else {
            Some(scored.into_iter().map(|s| s.item).collect())
        }
    }

    /// Direct vector similarity search with a confidence level derived
    /// from the average similarity of the top three anchors.
    async fn check_vector(&self, query: &str) -> (Vec<Item>, Confidence) {
        let memories = match self.memory.search(query, 5).await {
            Ok(m) => m,
            Err(_) => return (Vec::new(), Confidence::Low),
        };
        if memories.is_empty() {
            return (Vec::new(), Confidence::Low);
        }

        let top: Vec<f32> = memories.iter().take(3).map(Memory::similarity_or_zero).collect();
        let avg_similarity = top.iter().sum::<f32>() / top.len() as f32;
        let confidence = if avg_similarity > self.config.max_similarity_threshold {
            Confidence::High
        } else if avg_similarity >= self.config.min_similarity_threshold {
            Confidence::Medium
        } else {
            Confidence::Low
        };

        let items: Vec<Item> = memories.into_iter().map(Item::Memory).collect();
        let scored = self.scorer.filter_and_rank(&items, 3);
        (scored.into_iter().map(|s| s.item).collect(), confidence)
    }

    async fn check_orthogonal(&self, context: &str, query: &str) -> Option<OrthogonalCombined> {
        let results = self.orthogonal.search_all_strategies(context, query, &[], 2).await;
        if results.is_empty() {
            return None;
        }

        let (combined, metadata) = self.orthogonal.combine_results(&results, self.config.max_suggestions + 1);
        if combined.is_empty() {
            return None;
        }

        let vibe = results.iter().find_map(|r| r.vibe_profile.as_ref().filter(|v| !v.archetype.is_empty()).cloned());
        Some(OrthogonalCombined { items: combined, metadata, vibe })
    }
}

/// Boosts a candidate's score by how much the router wants its source
/// (web vs local) and how much it wants its intent (serendipity vs
/// relevance). Every embedding-arithmetic strategy (orthogonal itself,
/// plus the PCA/antonym/bridge specializations) counts toward the
/// serendipity branch — they're all flavors of the same "find something
/// unexpected" family, not the relevance-seeking vector/graph path.
fn apply_weight_boost(candidate: &mut ScoredCandidate, weights: &StrategyWeights) {
    let mut score = candidate.raw_score;

    score *= match candidate.source {
        Source::Web => 1.0 + weights.source_web,
        Source::Local => 1.0 + weights.source_local,
        Source::Mixed => 1.0,
    };

    let is_serendipitous =
        matches!(candidate.strategy, Strategy::Orthogonal | Strategy::Pca | Strategy::Antonym | Strategy::Bridge);
    score *= if is_serendipitous { 1.0 + weights.serendipity * 2.0 } else { 1.0 + weights.relevance };

    candidate.adjusted_score = score;
}

fn empty_weighted_result() -> CascadeResult {
    CascadeResult {
        items: Vec::new(),
        path: RetrievalPath::Weighted,
        confidence: Confidence::Low,
        graph_insight: false,
        should_offer_web: false,
        orthogonal: None,
        vibe: None,
        item_sources: Vec::new(),
        item_strategies: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(source: Source, strategy: Strategy, raw_score: f32) -> ScoredCandidate {
        ScoredCandidate {
            item: Item::Web(SearchResult {
                title: "t".to_string(),
                url: "https://example.com".to_string(),
                text: String::new(),
                score: raw_score,
                published_date: None,
            }),
            source,
            strategy,
            raw_score,
            adjusted_score: raw_score,
        }
    }

    #[test]
    fn weighted_allocation_boosts_orthogonal_items_by_serendipity() {
        let weights = StrategyWeights { serendipity: 0.9, relevance: 0.1, source_web: 0.2, source_local: 0.9, reasoning: String::new() };

        let mut orthogonal_candidate = candidate(Source::Web, Strategy::Orthogonal, 0.8);
        let mut vector_candidate = candidate(Source::Web, Strategy::Vector, 0.8);

        apply_weight_boost(&mut orthogonal_candidate, &weights);
        apply_weight_boost(&mut vector_candidate, &weights);

        // 0.8 * (1 + 0.2) * (1 + 1.8) = 2.688
        assert!((orthogonal_candidate.adjusted_score - 2.688).abs() < 1e-3);
        assert!(orthogonal_candidate.adjusted_score > vector_candidate.adjusted_score);
    }

    #[test]
    fn pca_antonym_bridge_all_count_as_serendipitous() {
        let weights = StrategyWeights::balanced("test");
        for strategy in [Strategy::Pca, Strategy::Antonym, Strategy::Bridge, Strategy::Orthogonal] {
            let mut c = candidate(Source::Web, strategy, 0.5);
            let mut baseline = candidate(Source::Web, Strategy::Vector, 0.5);
            apply_weight_boost(&mut c, &weights);
            apply_weight_boost(&mut baseline, &weights);
            assert!(c.adjusted_score > baseline.adjusted_score, "{strategy:?} should out-boost relevance path");
        }
    }

    #[test]
    fn local_source_boosts_by_source_local_weight() {
        let weights = StrategyWeights { serendipity: 0.0, relevance: 0.5, source_web: 0.1, source_local: 0.9, reasoning: String::new() };
        let mut c = ScoredCandidate {
            item: Item::Memory(Memory { id: "m".to_string(), content: "c".to_string(), similarity: Some(0.7), created_at: None, last_accessed: None, relationships: Vec::new() }),
            source: Source::Local,
            strategy: Strategy::Vector,
            raw_score: 0.7,
            adjusted_score: 0.7,
        };
        apply_weight_boost(&mut c, &weights);
        assert!((c.adjusted_score - 0.7 * 1.9 * 1.5).abs() < 1e-3);
    }
}
