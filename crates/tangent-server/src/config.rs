//! Process configuration, loaded once from the environment (spec §6,
//! expanded in SPEC_FULL.md §A.3).

use anyhow::{Context, Result};
use config::{Environment, File};

/// Every tunable spec §6 lists under "Configuration (environment)", plus
/// the handful of ambient fields (host/port, API keys, rate limiting)
/// the HTTP surface needs. Loaded once in `main` and handed around behind
/// an `Arc` — this struct itself holds no caches, it's plain data.
#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,

    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub embedding_base_url: String,
    pub embedding_model: String,

    pub exa_api_key: String,
    pub exa_base_url: String,

    pub supermemory_api_key: String,
    pub supermemory_base_url: String,

    pub max_anchors: usize,
    pub min_similarity_threshold: f32,
    pub max_similarity_threshold: f32,
    pub max_suggestions: usize,
    pub base_fetch_count: usize,

    pub orthogonal_enabled: bool,
    pub orthogonal_noise_scale: f32,
    pub orthogonal_target_domains: Vec<String>,
    pub orthogonal_vibe_temperature: f32,

    pub pca_lambda_surprise: f32,
    pub pca_min_memories: usize,
    pub pca_num_components: usize,
    pub antonym_alpha: f32,
    pub antonym_target_vibes: Vec<String>,
    pub rerank_pool_size: usize,
    pub rerank_top_k: usize,

    pub judge_log_path: String,
    pub rate_limit_requests_per_minute: u32,
}

impl Config {
    /// Loads configuration from the environment (`dotenvy::dotenv()` is
    /// expected to have already run in `main`), following the same
    /// `config`-crate recipe as `beagle-server::config::Config::from_env`:
    /// an `Environment` source with `__`-nesting and list parsing, plus
    /// an optional file named by `TANGENT_CONFIG_FILE`.
    pub fn from_env() -> Result<Self> {
        let mut builder = config::Config::builder().add_source(
            Environment::default()
                .separator("__")
                .try_parsing(true)
                .with_list_parse_key("ORTHOGONAL_TARGET_DOMAINS")
                .with_list_parse_key("ANTONYM_TARGET_VIBES"),
        );

        if let Ok(config_path) = std::env::var("TANGENT_CONFIG_FILE") {
            builder = builder.add_source(File::with_name(&config_path));
        }

        let settings = builder.build().context("failed to build configuration")?;

        let openai_api_key = settings.get_string("OPENAI_API_KEY").context("set OPENAI_API_KEY")?;
        let exa_api_key = settings.get_string("EXA_API_KEY").context("set EXA_API_KEY")?;
        let supermemory_api_key = settings.get_string("SUPERMEMORY_API_KEY").context("set SUPERMEMORY_API_KEY")?;

        Ok(Self {
            host: settings.get_string("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: settings.get_int("PORT").map(|v| v as u16).unwrap_or(8000),

            openai_api_key,
            openai_base_url: settings
                .get_string("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_model: settings.get_string("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4.1".to_string()),
            embedding_base_url: settings
                .get_string("EMBEDDING_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            embedding_model: settings
                .get_string("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),

            exa_api_key,
            exa_base_url: settings.get_string("EXA_BASE_URL").unwrap_or_else(|_| "https://api.exa.ai".to_string()),

            supermemory_api_key,
            supermemory_base_url: settings
                .get_string("SUPERMEMORY_BASE_URL")
                .unwrap_or_else(|_| "https://api.supermemory.ai".to_string()),

            max_anchors: settings.get_int("MAX_ANCHORS").map(|v| v as usize).unwrap_or(5),
            min_similarity_threshold: settings.get_float("MIN_SIMILARITY_THRESHOLD").map(|v| v as f32).unwrap_or(0.65),
            max_similarity_threshold: settings.get_float("MAX_SIMILARITY_THRESHOLD").map(|v| v as f32).unwrap_or(0.85),
            max_suggestions: settings.get_int("MAX_SUGGESTIONS").map(|v| v as usize).unwrap_or(3),
            base_fetch_count: settings.get_int("BASE_FETCH_COUNT").map(|v| v as usize).unwrap_or(10),

            orthogonal_enabled: settings.get_bool("ORTHOGONAL_ENABLED").unwrap_or(true),
            orthogonal_noise_scale: settings.get_float("ORTHOGONAL_NOISE_SCALE").map(|v| v as f32).unwrap_or(0.15),
            orthogonal_target_domains: settings
                .get_array("ORTHOGONAL_TARGET_DOMAINS")
                .map(|values| values.into_iter().filter_map(|v| v.into_string().ok()).collect())
                .unwrap_or_else(|_| default_target_domains()),
            orthogonal_vibe_temperature: settings.get_float("ORTHOGONAL_VIBE_TEMPERATURE").map(|v| v as f32).unwrap_or(0.8),

            pca_lambda_surprise: settings.get_float("PCA_LAMBDA_SURPRISE").map(|v| v as f32).unwrap_or(1.0),
            pca_min_memories: settings.get_int("PCA_MIN_MEMORIES").map(|v| v as usize).unwrap_or(5),
            pca_num_components: settings.get_int("PCA_NUM_COMPONENTS").map(|v| v as usize).unwrap_or(2),
            antonym_alpha: settings.get_float("ANTONYM_ALPHA").map(|v| v as f32).unwrap_or(0.5),
            antonym_target_vibes: settings
                .get_array("ANTONYM_TARGET_VIBES")
                .map(|values| values.into_iter().filter_map(|v| v.into_string().ok()).collect())
                .unwrap_or_else(|_| default_target_vibes()),
            rerank_pool_size: settings.get_int("RERANK_POOL_SIZE").map(|v| v as usize).unwrap_or(50),
            rerank_top_k: settings.get_int("RERANK_TOP_K").map(|v| v as usize).unwrap_or(5),

            judge_log_path: settings
                .get_string("JUDGE_LOG_PATH")
                .unwrap_or_else(|_| "training_data/decisions.jsonl".to_string()),
            rate_limit_requests_per_minute: settings
                .get_int("RATE_LIMIT_REQUESTS_PER_MINUTE")
                .map(|v| v.max(1) as u32)
                .unwrap_or(100),
        })
    }

    pub fn vectormath_config(&self) -> tangent_vectormath::VectorMathConfig {
        tangent_vectormath::VectorMathConfig {
            pca_lambda_surprise: self.pca_lambda_surprise,
            pca_min_memories: self.pca_min_memories,
            pca_num_components: self.pca_num_components,
            antonym_alpha: self.antonym_alpha,
            antonym_target_vibes: self.antonym_target_vibes.clone(),
            rerank_pool_size: self.rerank_pool_size,
            rerank_top_k: self.rerank_top_k,
        }
    }

    pub fn orthogonal_config(&self) -> tangent_orthogonal::OrthogonalConfig {
        tangent_orthogonal::OrthogonalConfig {
            noise_scale: self.orthogonal_noise_scale,
            target_domains: self.orthogonal_target_domains.clone(),
        }
    }

    pub fn router_config(&self) -> tangent_router::RouterConfig {
        tangent_router::RouterConfig {
            max_anchors: self.max_anchors,
            min_similarity_threshold: self.min_similarity_threshold,
            max_similarity_threshold: self.max_similarity_threshold,
            max_suggestions: self.max_suggestions,
            base_fetch_count: self.base_fetch_count,
        }
    }

    pub fn scorer_config(&self) -> tangent_scorer::ScorerConfig {
        tangent_scorer::ScorerConfig {
            min_similarity_threshold: self.min_similarity_threshold,
            max_similarity_threshold: self.max_similarity_threshold,
            ..tangent_scorer::ScorerConfig::default()
        }
    }
}

fn default_target_domains() -> Vec<String> {
    vec![
        "restaurant".to_string(),
        "movie".to_string(),
        "music".to_string(),
        "book".to_string(),
        "architecture".to_string(),
    ]
}

fn default_target_vibes() -> Vec<String> {
    vec![
        "cozy and intimate".to_string(),
        "chaotic and raw".to_string(),
        "minimalist and precise".to_string(),
        "playful and absurd".to_string(),
        "melancholy and quiet".to_string(),
    ]
}
