use serde::{Deserialize, Serialize};

use super::defaults;

/// Fixed per-strategy weights applied during recommendation fusion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyWeights {
    pub entity: f64,
    pub content: f64,
    pub relation: f64,
    pub temporal: f64,
}

impl Default for StrategyWeights {
    fn default() -> Self {
        Self {
            entity: defaults::DEFAULT_ENTITY_WEIGHT,
            content: defaults::DEFAULT_CONTENT_WEIGHT,
            relation: defaults::DEFAULT_RELATION_WEIGHT,
            temporal: defaults::DEFAULT_TEMPORAL_WEIGHT,
        }
    }
}

/// Retrieval and fusion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub weights: StrategyWeights,
    /// Minimum cosine similarity for content-based recommendations.
    pub content_threshold: f64,
    /// Half-width of the temporal neighbourhood, in hours.
    pub temporal_window_hours: f64,
    /// RRF smoothing constant.
    pub rrf_k: u32,
    /// Keyword weight in hybrid search.
    pub keyword_weight: f64,
    /// Semantic weight in hybrid search.
    pub semantic_weight: f64,
    /// Candidates pulled from each signal before hybrid combination.
    pub search_candidates: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            weights: StrategyWeights::default(),
            content_threshold: defaults::DEFAULT_CONTENT_THRESHOLD,
            temporal_window_hours: defaults::DEFAULT_TEMPORAL_WINDOW_HOURS,
            rrf_k: defaults::DEFAULT_RRF_K,
            keyword_weight: defaults::DEFAULT_KEYWORD_WEIGHT,
            semantic_weight: defaults::DEFAULT_SEMANTIC_WEIGHT,
            search_candidates: defaults::DEFAULT_SEARCH_CANDIDATES,
        }
    }
}
