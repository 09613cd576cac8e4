/// Tunables for OrthogonalSearcher, injected from process-wide settings.
#[derive(Debug, Clone)]
pub struct OrthogonalConfig {
    /// Standard-deviation analogue controlling how far a noise-injected
    /// query drifts from the original (spec default 0.15).
    pub noise_scale: f32,
    /// Candidate domains for archetype-bridge search — distinct from the
    /// fixed anchor-table domains `tangent_vectormath` uses for strategy 6.
    pub target_domains: Vec<String>,
}

impl Default for OrthogonalConfig {
    fn default() -> Self {
        Self {
            noise_scale: 0.15,
            target_domains: vec![
                "restaurant".to_string(),
                "travel destination".to_string(),
                "fashion".to_string(),
                "recipe".to_string(),
                "hobby craft".to_string(),
                "podcast".to_string(),
                "board game".to_string(),
                "architecture".to_string(),
            ],
        }
    }
}
