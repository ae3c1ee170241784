use std::fmt;

use serde::{Deserialize, Serialize};

use super::entity::Entity;

/// Independent recommendation signals, in tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Entity,
    Relation,
    Content,
    Temporal,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [Self::Entity, Self::Relation, Self::Content, Self::Temporal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entity => "entity",
            Self::Relation => "relation",
            Self::Content => "content",
            Self::Temporal => "temporal",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One strategy's opinion about one memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyHit {
    pub memory_id: String,
    pub score: f64,
    pub reason: String,
}

impl StrategyHit {
    pub fn new(memory_id: impl Into<String>, score: f64, reason: impl Into<String>) -> Self {
        Self {
            memory_id: memory_id.into(),
            score,
            reason: reason.into(),
        }
    }
}

/// Fused recommendation across strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedRecommendation {
    pub memory_id: String,
    /// Combined score normalized by the global maximum, 0.0–1.0.
    pub score: f64,
    /// Weighted sum before normalization.
    pub raw_score: f64,
    pub strategies: Vec<StrategyKind>,
    pub reasons: Vec<String>,
}

impl FusedRecommendation {
    /// All contributing reasons joined into one line.
    pub fn reason(&self) -> String {
        self.reasons.join("; ")
    }
}

/// One row of a hybrid or RRF ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHit {
    pub memory_id: String,
    pub score: f64,
    pub keyword_score: Option<f64>,
    pub semantic_score: Option<f64>,
}

/// Recoverable loss of a signal, reported alongside results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    EmbeddingUnavailable { reason: String },
}

/// Ranked search output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub hits: Vec<RankedHit>,
    pub degradations: Vec<Degradation>,
}

impl SearchResponse {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

/// A memory associated with a searched entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySearchHit {
    pub memory_id: String,
    pub relevance: f64,
}

/// Result of looking up memories by entity name. `found == false` is a
/// normal outcome, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySearchResult {
    pub query: String,
    pub found: bool,
    pub entity: Option<Entity>,
    pub memories: Vec<EntitySearchHit>,
    pub message: Option<String>,
}

impl EntitySearchResult {
    pub fn not_found(query: &str) -> Self {
        Self {
            query: query.to_string(),
            found: false,
            entity: None,
            memories: Vec::new(),
            message: Some(format!("entity not found: {query}")),
        }
    }
}
