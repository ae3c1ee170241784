use serde::{Deserialize, Serialize};

use super::defaults;

/// Embedding gateway contract: which model and which vector size to expect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model tag stored next to every embedding.
    pub model: String,
    /// Fixed vector dimension for the configured model.
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: defaults::DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: defaults::DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}
