/// Tunables for CascadeRouter, injected from process-wide settings.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub max_anchors: usize,
    pub min_similarity_threshold: f32,
    pub max_similarity_threshold: f32,
    pub max_suggestions: usize,
    /// Total fetch pool size `route_weighted` allocates across web/local
    /// before ranking (spec default 10).
    pub base_fetch_count: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_anchors: 5,
            min_similarity_threshold: 0.65,
            max_similarity_threshold: 0.85,
            max_suggestions: 3,
            base_fetch_count: 10,
        }
    }
}
