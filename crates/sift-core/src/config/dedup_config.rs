use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::constants::AUTO_CAPTURE_TAG;

/// Near-duplicate detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Similarity above which a recent memory counts as a duplicate.
    pub similarity_threshold: f64,
    /// Similarity above which an auto-captured duplicate is merged without asking.
    pub auto_merge_threshold: f64,
    /// Default look-back window in seconds.
    pub window_secs: u64,
    /// Per-context window overrides (context name → seconds).
    pub context_windows: HashMap<String, u64>,
    /// Per-platform window overrides (platform name → seconds).
    pub platform_windows: HashMap<String, u64>,
    /// Tag identifying automatically captured memories.
    pub auto_capture_tag: String,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: defaults::DEFAULT_DUPLICATE_THRESHOLD,
            auto_merge_threshold: defaults::DEFAULT_AUTO_MERGE_THRESHOLD,
            window_secs: defaults::DEFAULT_DEDUP_WINDOW_SECS,
            context_windows: HashMap::new(),
            platform_windows: HashMap::new(),
            auto_capture_tag: AUTO_CAPTURE_TAG.to_string(),
        }
    }
}

impl DedupConfig {
    /// Resolve the effective window: explicit → context → platform → default.
    pub fn resolve_window(
        &self,
        explicit: Option<u64>,
        context: &str,
        platform: Option<&str>,
    ) -> u64 {
        explicit
            .or_else(|| self.context_windows.get(context).copied())
            .or_else(|| platform.and_then(|p| self.platform_windows.get(p).copied()))
            .unwrap_or(self.window_secs)
    }
}
