use serde::{Deserialize, Serialize};

use super::defaults;

/// Entity graph deduplication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityConfig {
    /// Name similarity above which two same-typed entities are fuzzy duplicates.
    pub fuzzy_threshold: f64,
    /// Confidence assigned to pairs from AI alias grouping.
    pub ai_alias_confidence: f64,
    /// Confidence at/above which bulk deduplication may auto-merge.
    pub bulk_confidence_threshold: f64,
    /// Enable the AI alias-grouping detector.
    pub ai_grouping: bool,
    /// Maximum names sent to the generator per grouping request.
    pub ai_grouping_batch: usize,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: defaults::DEFAULT_FUZZY_THRESHOLD,
            ai_alias_confidence: defaults::DEFAULT_AI_ALIAS_CONFIDENCE,
            bulk_confidence_threshold: defaults::DEFAULT_BULK_CONFIDENCE_THRESHOLD,
            ai_grouping: true,
            ai_grouping_batch: defaults::DEFAULT_AI_GROUPING_BATCH,
        }
    }
}
