use serde::{Deserialize, Serialize};

/// Abstract aesthetic fingerprint of a piece of content.
///
/// Constructed once by `ConceptExtractor::extract_vibe` and never mutated
/// afterward — every consumer downstream borrows it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VibeProfile {
    /// Short abstract feelings: melancholy, chaotic, intimate, precise...
    #[serde(default)]
    pub emotional_signatures: Vec<String>,
    /// The kind of person who values this content.
    #[serde(default)]
    pub archetype: String,
    /// Unrelated domains/things this archetype would also appreciate.
    #[serde(default)]
    pub cross_domain_interests: Vec<String>,
    /// What this aesthetic explicitly rejects.
    #[serde(default)]
    pub anti_patterns: Vec<String>,
    /// The domain this vibe was extracted from, e.g. "pottery".
    #[serde(default)]
    pub source_domain: String,
}

impl VibeProfile {
    pub fn is_empty(&self) -> bool {
        self.emotional_signatures.is_empty()
            && self.archetype.is_empty()
            && self.cross_domain_interests.is_empty()
            && self.anti_patterns.is_empty()
            && self.source_domain.is_empty()
    }
}

/// LLM-determined weights for retrieval strategies. Values are intensities
/// in `[0, 1]`, not a probability distribution — they need not sum to 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyWeights {
    /// Weight for novelty, unexpected connections, and "vibes".
    pub serendipity: f32,
    /// Weight for direct semantic similarity and factual accuracy.
    pub relevance: f32,
    /// Necessity of external, fresh, world knowledge.
    pub source_web: f32,
    /// Necessity of the user's own memories, notes, and history.
    pub source_local: f32,
    #[serde(default)]
    pub reasoning: String,
}

impl StrategyWeights {
    /// Clamps every weight into `[0, 1]`; the judge must never hand back
    /// values outside that range regardless of where they came from.
    pub fn clamped(mut self) -> Self {
        self.serendipity = self.serendipity.clamp(0.0, 1.0);
        self.relevance = self.relevance.clamp(0.0, 1.0);
        self.source_web = self.source_web.clamp(0.0, 1.0);
        self.source_local = self.source_local.clamp(0.0, 1.0);
        self
    }

    pub fn balanced(reasoning: impl Into<String>) -> Self {
        Self {
            serendipity: 0.4,
            relevance: 0.6,
            source_web: 0.5,
            source_local: 0.5,
            reasoning: reasoning.into(),
        }
    }
}
