/// Tunables for VectorMath, injected from the process-wide settings rather
/// than read directly — keeps this crate free of a dependency on the
/// server's config loader.
#[derive(Debug, Clone)]
pub struct VectorMathConfig {
    pub pca_lambda_surprise: f32,
    pub pca_min_memories: usize,
    pub pca_num_components: usize,
    pub antonym_alpha: f32,
    pub antonym_target_vibes: Vec<String>,
    pub rerank_pool_size: usize,
    pub rerank_top_k: usize,
}

impl Default for VectorMathConfig {
    fn default() -> Self {
        Self {
            pca_lambda_surprise: 1.0,
            pca_min_memories: 5,
            pca_num_components: 2,
            antonym_alpha: 0.5,
            antonym_target_vibes: vec![
                "cozy and intimate".to_string(),
                "chaotic and raw".to_string(),
                "minimalist and precise".to_string(),
                "playful and absurd".to_string(),
                "melancholy and quiet".to_string(),
            ],
            rerank_pool_size: 50,
            rerank_top_k: 5,
        }
    }
}
