use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Content delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Budget used when a model matches neither an exact key nor a family.
    pub default_budget: usize,
    /// Extra or overriding entries for the model budget table.
    pub model_budgets: HashMap<String, usize>,
    /// Budget at/above which content is delivered whole.
    pub full_threshold: usize,
    /// Budget at/above which content is smart-chunked.
    pub smart_chunk_threshold: usize,
    /// Chunk size used by the smart-chunk strategy.
    pub smart_chunk_tokens: usize,
    /// Overlap carried between consecutive chunks.
    pub chunk_overlap_tokens: usize,
    /// Sliding window size for embedding chunks.
    pub embedding_window_tokens: usize,
    /// Sliding window stride for embedding chunks.
    pub embedding_stride_tokens: usize,
    /// Granularities for hierarchical chunking.
    pub hierarchy_levels: Vec<usize>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            default_budget: defaults::DEFAULT_TOKEN_BUDGET,
            model_budgets: HashMap::new(),
            full_threshold: defaults::DEFAULT_FULL_THRESHOLD,
            smart_chunk_threshold: defaults::DEFAULT_SMART_CHUNK_THRESHOLD,
            smart_chunk_tokens: defaults::DEFAULT_SMART_CHUNK_TOKENS,
            chunk_overlap_tokens: defaults::DEFAULT_CHUNK_OVERLAP_TOKENS,
            embedding_window_tokens: defaults::DEFAULT_EMBEDDING_WINDOW_TOKENS,
            embedding_stride_tokens: defaults::DEFAULT_EMBEDDING_STRIDE_TOKENS,
            hierarchy_levels: defaults::DEFAULT_HIERARCHY_LEVELS.to_vec(),
        }
    }
}
