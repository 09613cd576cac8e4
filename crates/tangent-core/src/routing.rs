use serde::{Deserialize, Serialize};

use crate::memory::{Memory, SearchResult};

/// Either half of the candidate universe the router juggles. Kept as an
/// enum rather than a trait object — callers pattern-match far more often
/// than they need dynamic dispatch, and every downstream consumer
/// (Scorer, VectorMath, Synthesizer) needs to branch on which kind of
/// item it is anyway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Item {
    Memory(Memory),
    Web(SearchResult),
}

impl Item {
    pub fn text(&self) -> &str {
        match self {
            Item::Memory(m) => &m.content,
            Item::Web(w) => &w.text,
        }
    }

    pub fn fingerprint(&self) -> &str {
        match self {
            Item::Memory(m) => m.fingerprint(),
            Item::Web(w) => w.fingerprint(),
        }
    }

    pub fn similarity_or_zero(&self) -> f32 {
        match self {
            Item::Memory(m) => m.similarity_or_zero(),
            Item::Web(w) => w.score,
        }
    }
}

/// Where a `ScoredCandidate` was sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Web,
    Local,
    Mixed,
}

/// Which retrieval strategy produced a `ScoredCandidate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Orthogonal,
    Vector,
    Graph,
    Pca,
    Antonym,
    Bridge,
}

/// Internal wrapper produced during weighted routing: an item plus its
/// raw and weight-adjusted score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub item: Item,
    pub source: Source,
    pub strategy: Strategy,
    pub raw_score: f32,
    pub adjusted_score: f32,
}

/// Which of the three routing modes (or combinations thereof) produced a
/// `CascadeResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalPath {
    Graph,
    GraphPlusWeb,
    Vector,
    VectorPlusWeb,
    Web,
    Orthogonal,
    OrthogonalPlusGraph,
    Weighted,
}

impl RetrievalPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalPath::Graph => "graph",
            RetrievalPath::GraphPlusWeb => "graph_plus_web",
            RetrievalPath::Vector => "vector",
            RetrievalPath::VectorPlusWeb => "vector_plus_web",
            RetrievalPath::Web => "web",
            RetrievalPath::Orthogonal => "orthogonal",
            RetrievalPath::OrthogonalPlusGraph => "orthogonal_plus_graph",
            RetrievalPath::Weighted => "weighted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

/// Provenance carried back from OrthogonalSearcher so the response (and
/// the decision log) can explain what was subtracted / steered toward.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrthogonalMetadata {
    pub strategies_used: Vec<Strategy>,
    pub queries_used: Vec<String>,
    pub subtracted_tags: Vec<String>,
    pub target_vibe: Option<String>,
}

/// The internal routing outcome handed from CascadeRouter to the rest of
/// the pipeline.
#[derive(Debug, Clone)]
pub struct CascadeResult {
    pub items: Vec<Item>,
    pub path: RetrievalPath,
    pub confidence: Confidence,
    pub graph_insight: bool,
    pub should_offer_web: bool,
    pub orthogonal: Option<OrthogonalMetadata>,
    pub vibe: Option<crate::vibe::VibeProfile>,
    /// Per-item source/strategy provenance, parallel to `items` when
    /// populated. `route_weighted` is the only producer that fills this
    /// in — an `Item::Web` there can come from either the plain web fetch
    /// or one of the orthogonal strategies, and the two must stay
    /// distinguishable for the Suggestion's source tag even after the
    /// candidates collapse to plain `Item`s. Empty for the legacy cascade
    /// paths, where the item's own variant (Memory vs Web) already says
    /// everything a caller needs.
    pub item_sources: Vec<Source>,
    pub item_strategies: Vec<Strategy>,
}
