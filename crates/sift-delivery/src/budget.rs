//! Model token budgets and strategy selection.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use sift_core::config::DeliveryConfig;

/// Built-in context sizes. Keys are matched exactly first, then as substrings.
const BUILTIN_BUDGETS: &[(&str, usize)] = &[
    ("gpt-4o", 128_000),
    ("gpt-4o-mini", 128_000),
    ("gpt-4-turbo", 128_000),
    ("gpt-4-32k", 32_768),
    ("gpt-4", 8_192),
    ("gpt-3.5-turbo", 16_385),
    ("claude-3", 200_000),
    ("claude", 100_000),
    ("gemini-1.5", 1_000_000),
    ("gemini", 32_000),
    ("llama-3", 8_192),
    ("mistral", 32_000),
    ("mixtral", 32_000),
];

/// How content is shaped for a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStrategy {
    /// Whole content, truncated only if it exceeds the budget.
    Full,
    /// Overlapping chunks the consumer can page through.
    SmartChunk,
    /// Head of the content, cut to the budget.
    Summary,
}

/// Lookup table from model name to token budget.
#[derive(Debug, Clone)]
pub struct ModelBudgets {
    table: HashMap<String, usize>,
    default_budget: usize,
    full_threshold: usize,
    smart_chunk_threshold: usize,
}

impl ModelBudgets {
    /// Built-in table with the config's entries layered on top.
    pub fn from_config(config: &DeliveryConfig) -> Self {
        let mut table: HashMap<String, usize> = BUILTIN_BUDGETS
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        for (model, budget) in &config.model_budgets {
            table.insert(model.to_lowercase(), *budget);
        }
        Self {
            table,
            default_budget: config.default_budget,
            full_threshold: config.full_threshold,
            smart_chunk_threshold: config.smart_chunk_threshold,
        }
    }

    /// Exact key, then the longest family key contained in the name, else the default.
    pub fn budget_for(&self, model: &str) -> usize {
        let model = model.trim().to_lowercase();
        if let Some(budget) = self.table.get(&model) {
            return *budget;
        }
        self.table
            .iter()
            .filter(|(family, _)| model.contains(family.as_str()))
            .max_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| b.0.cmp(a.0)))
            .map(|(_, budget)| *budget)
            .unwrap_or(self.default_budget)
    }

    pub fn strategy_for_budget(&self, budget: usize) -> DeliveryStrategy {
        if budget >= self.full_threshold {
            DeliveryStrategy::Full
        } else if budget >= self.smart_chunk_threshold {
            DeliveryStrategy::SmartChunk
        } else {
            DeliveryStrategy::Summary
        }
    }

    pub fn strategy_for(&self, model: &str) -> DeliveryStrategy {
        self.strategy_for_budget(self.budget_for(model))
    }
}

impl Default for ModelBudgets {
    fn default() -> Self {
        Self::from_config(&DeliveryConfig::default())
    }
}
