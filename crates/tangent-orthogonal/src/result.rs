use tangent_core::{SearchResult, Strategy, VibeProfile};

/// Which of the six serendipity strategies produced an `OrthogonalResult`.
///
/// Collapses to the coarser `tangent_core::Strategy` tag wherever a
/// `ScoredCandidate` or `OrthogonalMetadata` needs one — the three
/// embedding-arithmetic strategies each get their own `Strategy` variant,
/// the three query-rewrite strategies all collapse to `Strategy::Orthogonal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrthogonalStrategy {
    NoiseInjection,
    ArchetypeBridge,
    CrossDomain,
    PcaSearch,
    AntonymSearch,
    BridgeSearch,
}

impl OrthogonalStrategy {
    pub fn as_core_strategy(&self) -> Strategy {
        match self {
            OrthogonalStrategy::NoiseInjection
            | OrthogonalStrategy::ArchetypeBridge
            | OrthogonalStrategy::CrossDomain => Strategy::Orthogonal,
            OrthogonalStrategy::PcaSearch => Strategy::Pca,
            OrthogonalStrategy::AntonymSearch => Strategy::Antonym,
            OrthogonalStrategy::BridgeSearch => Strategy::Bridge,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrthogonalStrategy::NoiseInjection => "noise_injection",
            OrthogonalStrategy::ArchetypeBridge => "archetype_bridge",
            OrthogonalStrategy::CrossDomain => "cross_domain",
            OrthogonalStrategy::PcaSearch => "pca_search",
            OrthogonalStrategy::AntonymSearch => "antonym_search",
            OrthogonalStrategy::BridgeSearch => "bridge_search",
        }
    }
}

/// Output of a single orthogonal strategy, carrying enough provenance for
/// `combine_results` and the decision log to explain what was subtracted
/// or steered toward.
#[derive(Debug, Clone)]
pub struct OrthogonalResult {
    pub items: Vec<SearchResult>,
    pub strategy: OrthogonalStrategy,
    pub query_used: String,
    pub vibe_profile: Option<VibeProfile>,
    pub target_domain: Option<String>,
    pub subtracted_tags: Vec<String>,
    pub target_vibe: Option<String>,
}

impl OrthogonalResult {
    pub fn empty(strategy: OrthogonalStrategy) -> Self {
        Self {
            items: Vec::new(),
            strategy,
            query_used: String::new(),
            vibe_profile: None,
            target_domain: None,
            subtracted_tags: Vec::new(),
            target_vibe: None,
        }
    }
}
