//! ContentDeliveryAdapter: config-driven entry point for every delivery operation.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use sift_core::config::DeliveryConfig;
use sift_tokens::TokenCounter;

use crate::budget::{DeliveryStrategy, ModelBudgets};
use crate::chunker::{chunk_text, Chunk};
use crate::truncate::{truncate_to_tokens, Precision, TruncationResult};
use crate::windows::{chunk_for_embedding, create_hierarchical_chunks, ChunkLevel, EmbeddingWindow};

/// Payload shaped by the selected strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum DeliveredContent {
    Full(TruncationResult),
    SmartChunk { chunks: Vec<Chunk> },
    Summary(TruncationResult),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedContent {
    pub model: String,
    pub budget: usize,
    pub strategy: DeliveryStrategy,
    pub precision: Precision,
    pub content: DeliveredContent,
}

pub struct ContentDeliveryAdapter {
    config: DeliveryConfig,
    budgets: ModelBudgets,
    counter: TokenCounter,
}

impl ContentDeliveryAdapter {
    pub fn new(config: DeliveryConfig, counter: TokenCounter) -> Self {
        let budgets = ModelBudgets::from_config(&config);
        Self {
            config,
            budgets,
            counter,
        }
    }

    pub fn counter(&self) -> &TokenCounter {
        &self.counter
    }

    pub fn budget_for(&self, model: &str) -> usize {
        self.budgets.budget_for(model)
    }

    pub fn strategy_for(&self, model: &str) -> DeliveryStrategy {
        self.budgets.strategy_for(model)
    }

    /// Fit `content` into the model's budget.
    pub fn truncate_to_limit(&self, content: &str, model: &str, preserve_end: bool) -> TruncationResult {
        let limit = self.budgets.budget_for(model);
        truncate_to_tokens(&self.counter, content, limit, preserve_end)
    }

    pub fn chunk_text(&self, text: &str, max_tokens: usize, overlap_tokens: usize) -> Vec<Chunk> {
        chunk_text(&self.counter, text, max_tokens, overlap_tokens)
    }

    /// Sliding windows using the configured size and stride.
    pub fn chunk_for_embedding(&self, text: &str) -> Vec<EmbeddingWindow> {
        chunk_for_embedding(
            &self.counter,
            text,
            self.config.embedding_window_tokens,
            self.config.embedding_stride_tokens,
        )
    }

    pub fn chunk_for_embedding_with(
        &self,
        text: &str,
        max_tokens: usize,
        stride: usize,
    ) -> Vec<EmbeddingWindow> {
        chunk_for_embedding(&self.counter, text, max_tokens, stride)
    }

    /// Chunkings at the configured hierarchy levels.
    pub fn create_hierarchical_chunks(&self, text: &str) -> Vec<ChunkLevel> {
        create_hierarchical_chunks(&self.counter, text, &self.config.hierarchy_levels)
    }

    /// Budget lookup, strategy selection, and the matching transformation.
    #[instrument(skip(self, content), fields(len = content.len()))]
    pub fn prepare_content_for_model(&self, content: &str, model: &str) -> PreparedContent {
        let budget = self.budgets.budget_for(model);
        let strategy = self.budgets.strategy_for_budget(budget);
        debug!(budget, ?strategy, "delivery strategy selected");

        let delivered = match strategy {
            DeliveryStrategy::Full => {
                DeliveredContent::Full(truncate_to_tokens(&self.counter, content, budget, false))
            }
            DeliveryStrategy::SmartChunk => DeliveredContent::SmartChunk {
                chunks: chunk_text(
                    &self.counter,
                    content,
                    self.config.smart_chunk_tokens.min(budget),
                    self.config.chunk_overlap_tokens,
                ),
            },
            DeliveryStrategy::Summary => {
                DeliveredContent::Summary(truncate_to_tokens(&self.counter, content, budget, false))
            }
        };

        PreparedContent {
            model: model.to_string(),
            budget,
            strategy,
            precision: Precision::of(&self.counter),
            content: delivered,
        }
    }
}

impl Default for ContentDeliveryAdapter {
    fn default() -> Self {
        Self::new(DeliveryConfig::default(), TokenCounter::default())
    }
}
