//! Doughnut MMR scoring and temporal novelty boost (spec §4.3).
//!
//! The "doughnut": very-high similarity is penalized (the echo chamber —
//! the hole), the `[0.65, 0.85)` band is bonused (the sweet spot — the
//! ring), and anything more distant is included but scored down. Memory
//! items additionally get a temporal boost: the longer since a memory was
//! last accessed, the more its score and novelty are lifted, on the
//! premise that resurfacing forgotten content is the whole point.

use tangent_core::Item;

/// Tunables mirroring `scoring.py`'s constructor defaults.
#[derive(Debug, Clone, Copy)]
pub struct ScorerConfig {
    pub min_similarity_threshold: f32,
    pub max_similarity_threshold: f32,
    pub echo_penalty: f32,
    pub sweet_spot_bonus: f32,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            min_similarity_threshold: 0.65,
            max_similarity_threshold: 0.85,
            echo_penalty: 0.5,
            sweet_spot_bonus: 1.2,
        }
    }
}

/// A scored item: the item itself plus the three scores `filter_and_rank`
/// produces. `final_score` drives ranking; `relevance`/`novelty` are the
/// values exposed on the outgoing `Suggestion`.
#[derive(Debug, Clone)]
pub struct ScoredItem {
    pub item: Item,
    pub final_score: f32,
    pub relevance: f32,
    pub novelty: f32,
}

pub struct Scorer {
    config: ScorerConfig,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(ScorerConfig::default())
    }
}

impl Scorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    /// Similarity used for doughnut banding. Memory items use their own
    /// similarity (0.0 if absent, e.g. a graph-pivot neighbor with no
    /// direct query similarity). Web results synthesize one from rank so
    /// they fall inside the sweet spot by construction: `max(0.65, 0.85 -
    /// 0.05 * index)`, using the item's position in the *whole* input
    /// list (matching the original's plain `enumerate`).
    fn similarity_for(&self, item: &Item, index: usize) -> f32 {
        match item {
            Item::Memory(m) => m.similarity_or_zero(),
            Item::Web(_) => (0.85 - index as f32 * 0.05).max(0.65),
        }
    }

    fn doughnut_band(&self, sim: f32) -> (f32, f32) {
        if sim >= self.config.max_similarity_threshold {
            let relevance = (sim * self.config.echo_penalty).min(1.0);
            (relevance, 0.2)
        } else if sim >= self.config.min_similarity_threshold {
            let relevance = (sim * self.config.sweet_spot_bonus).min(1.0);
            let span = self.config.max_similarity_threshold - self.config.min_similarity_threshold;
            let novelty = 1.0 - (sim - self.config.min_similarity_threshold) / span;
            (relevance, novelty.clamp(0.5, 1.0))
        } else {
            ((sim * 0.8).min(1.0), 0.8)
        }
    }

    /// MMR doughnut pass only, no temporal boost. Exposed separately so
    /// callers that want raw relevance/novelty without the age multiplier
    /// (e.g. web-only result sets) can use it directly.
    pub fn apply_mmr_scoring(&self, items: &[Item]) -> Vec<ScoredItem> {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let sim = self.similarity_for(item, index);
                let (relevance, novelty) = self.doughnut_band(sim);
                ScoredItem { item: item.clone(), final_score: relevance, relevance, novelty }
            })
            .collect()
    }

    /// `Score_final = Score × (1 + ln(days_since_last_accessed))`, and
    /// `novelty' = min(1, novelty × (1 + ln(days)/10))`. Only applies to
    /// `Memory` items carrying a `last_accessed` timestamp; web results
    /// pass through unchanged.
    pub fn apply_temporal_boost(&self, scored: Vec<ScoredItem>) -> Vec<ScoredItem> {
        let now = chrono::Utc::now();
        scored
            .into_iter()
            .map(|mut scored_item| {
                let Item::Memory(memory) = &scored_item.item else {
                    return scored_item;
                };
                let Some(last_accessed) = memory.last_accessed else {
                    return scored_item;
                };

                let days_since = (now - last_accessed).num_days().max(1) as f32;
                let log_days = days_since.ln();

                scored_item.final_score *= 1.0 + log_days;
                scored_item.novelty = (scored_item.novelty * (1.0 + log_days / 10.0)).min(1.0);
                scored_item
            })
            .collect()
    }

    /// Full pipeline: doughnut scoring, temporal boost, drop non-positive
    /// scores, sort descending, truncate to `max_results`.
    pub fn filter_and_rank(&self, items: &[Item], max_results: usize) -> Vec<ScoredItem> {
        let scored = self.apply_mmr_scoring(items);
        let boosted = self.apply_temporal_boost(scored);

        let mut valid: Vec<ScoredItem> = boosted.into_iter().filter(|s| s.final_score > 0.0).collect();
        valid.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));
        valid.truncate(max_results);
        valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tangent_core::{Memory, SearchResult};

    fn memory_with_similarity(sim: f32) -> Item {
        Item::Memory(Memory {
            id: "m".to_string(),
            content: "content".to_string(),
            similarity: Some(sim),
            created_at: None,
            last_accessed: None,
            relationships: Vec::new(),
        })
    }

    #[test]
    fn doughnut_scoring_matches_spec_example() {
        let scorer = Scorer::default();
        let items = vec![memory_with_similarity(0.95), memory_with_similarity(0.75), memory_with_similarity(0.40)];

        let scored = scorer.apply_mmr_scoring(&items);

        assert!((scored[0].relevance - 0.475).abs() < 1e-4);
        assert!((scored[0].novelty - 0.2).abs() < 1e-6);

        assert!((scored[1].relevance - 0.9).abs() < 1e-4);
        assert!(scored[1].novelty >= 0.5 && scored[1].novelty <= 1.0);

        assert!((scored[2].relevance - 0.32).abs() < 1e-4);
        assert!((scored[2].novelty - 0.8).abs() < 1e-6);
    }

    #[test]
    fn echo_chamber_novelty_is_always_point_two() {
        let scorer = Scorer::default();
        let (_, novelty) = scorer.doughnut_band(0.99);
        assert_eq!(novelty, 0.2);
    }

    #[test]
    fn echo_chamber_boundary_is_inclusive() {
        let scorer = Scorer::default();
        let (relevance, novelty) = scorer.doughnut_band(0.85);
        assert_eq!(novelty, 0.2);
        assert!((relevance - 0.85 * 0.5).abs() < 1e-6);
    }

    #[test]
    fn sweet_spot_novelty_is_bounded() {
        let scorer = Scorer::default();
        let (_, novelty) = scorer.doughnut_band(0.70);
        assert!((0.5..=1.0).contains(&novelty));
    }

    #[test]
    fn web_results_synthesize_sweet_spot_similarity() {
        let scorer = Scorer::default();
        let web = |i: usize| {
            Item::Web(SearchResult {
                title: format!("result {i}"),
                url: format!("https://example.com/{i}"),
                text: "text".to_string(),
                score: 0.5,
                published_date: None,
            })
        };
        let items = vec![web(0), web(1), web(2), web(3), web(4), web(5)];

        for (index, item) in items.iter().enumerate() {
            let sim = scorer.similarity_for(item, index);
            assert!(sim >= 0.65);
        }
    }

    #[test]
    fn temporal_boost_lifts_old_memories() {
        let scorer = Scorer::default();
        let old_memory = Item::Memory(Memory {
            id: "m".to_string(),
            content: "content".to_string(),
            similarity: Some(0.70),
            created_at: None,
            last_accessed: Some(chrono::Utc::now() - chrono::Duration::days(30)),
            relationships: Vec::new(),
        });

        let scored = scorer.apply_mmr_scoring(&[old_memory]);
        let base_score = scored[0].final_score;
        let boosted = scorer.apply_temporal_boost(scored);

        assert!(boosted[0].final_score > base_score);
    }

    #[test]
    fn filter_and_rank_drops_non_positive_and_sorts_descending() {
        let scorer = Scorer::default();
        let items = vec![memory_with_similarity(0.40), memory_with_similarity(0.95), memory_with_similarity(0.75)];

        let ranked = scorer.filter_and_rank(&items, 3);

        assert_eq!(ranked.len(), 3);
        assert!(ranked[0].final_score >= ranked[1].final_score);
        assert!(ranked[1].final_score >= ranked[2].final_score);
    }

    proptest::proptest! {
        /// ∀ scorer output with sim ≥ 0.85: noveltyScore = 0.2 (spec §8's
        /// stated invariant), for any similarity in the echo-chamber band.
        #[test]
        fn echo_chamber_similarity_always_yields_point_two_novelty(sim in 0.85f32..=1.0f32) {
            let scorer = Scorer::default();
            let (_, novelty) = scorer.doughnut_band(sim);
            proptest::prop_assert_eq!(novelty, 0.2);
        }

        /// Sweet-spot novelty always lands in `[0.5, 1.0]`, for any
        /// similarity inside `[min_similarity_threshold,
        /// max_similarity_threshold)`.
        #[test]
        fn sweet_spot_similarity_keeps_novelty_bounded(sim in 0.65f32..0.85f32) {
            let scorer = Scorer::default();
            let (_, novelty) = scorer.doughnut_band(sim);
            proptest::prop_assert!((0.5..=1.0).contains(&novelty));
        }

        #[test]
        fn filter_and_rank_never_grows_the_input(
            sims in proptest::collection::vec(0.0f32..=1.0f32, 0..20),
            max_results in 0usize..10,
        ) {
            let scorer = Scorer::default();
            let items: Vec<Item> = sims.into_iter().map(memory_with_similarity).collect();
            let ranked = scorer.filter_and_rank(&items, max_results);
            proptest::prop_assert!(ranked.len() <= items.len());
            proptest::prop_assert!(ranked.len() <= max_results);
        }
    }
}
