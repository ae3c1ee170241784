use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::SiftError;

/// A named concept extracted from memory content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    /// Canonical display name.
    pub name: String,
    pub entity_type: String,
    pub aliases: Vec<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    pub fn new(
        name: impl Into<String>,
        entity_type: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            entity_type: entity_type.into(),
            aliases: Vec::new(),
            description: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Case-insensitive match against the canonical name or any alias.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    /// Add an alias unless it is already the name or an existing alias.
    pub fn add_alias(&mut self, alias: &str) {
        let alias = alias.trim();
        if alias.is_empty() || self.answers_to(alias) {
            return;
        }
        self.aliases.push(alias.to_string());
    }
}

/// Directed, typed edge between two entities. (from, to, type) is unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub from_entity: String,
    pub to_entity: String,
    pub relation_type: String,
}

/// Join row linking a memory to an entity it mentions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntityAssociation {
    pub memory_id: String,
    pub entity_id: String,
    /// Relevance of the entity to the memory, 0.0–1.0.
    pub relevance: f64,
}

/// How the surviving entity's fields are computed during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    KeepPrimary,
    KeepSecondary,
    Combine,
}

impl MergeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeepPrimary => "keep_primary",
            Self::KeepSecondary => "keep_secondary",
            Self::Combine => "combine",
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStrategy {
    type Err = SiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep_primary" => Ok(Self::KeepPrimary),
            "keep_secondary" => Ok(Self::KeepSecondary),
            "combine" => Ok(Self::Combine),
            other => Err(SiftError::InvalidArgument {
                reason: format!("unknown merge strategy: {other}"),
            }),
        }
    }
}

/// Append-only audit record of one merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeHistoryEntry {
    pub id: String,
    pub primary_id: String,
    pub secondary_id: String,
    pub strategy: MergeStrategy,
    pub merged_at: DateTime<Utc>,
    /// Secondary's name at merge time.
    pub secondary_name: String,
    /// Secondary's description at merge time.
    pub secondary_description: String,
}

/// Forwarding index entry: a retired entity id and the id that absorbed it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityForward {
    pub retired_id: String,
    pub surviving_id: String,
    pub merged_at: DateTime<Utc>,
}

/// Everything the store needs to execute one merge atomically.
#[derive(Debug, Clone)]
pub struct MergePlan {
    /// Primary entity with its final name/description/aliases already applied.
    pub survivor: Entity,
    pub secondary_id: String,
    pub history: MergeHistoryEntry,
}

/// Outcome counters of a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    /// Distinct memories whose association moved to (or collapsed into) the primary.
    pub memories_affected: usize,
    /// Relation edges that touched the secondary.
    pub relations_affected: usize,
    /// Redirects skipped because the primary already had the same association/edge.
    pub duplicates_skipped: usize,
}

/// Entity mention produced by an extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub name: String,
    pub entity_type: String,
    #[serde(default)]
    pub description: String,
    /// Relevance to the source memory, 0.0–1.0.
    pub relevance: f64,
}

/// Relation produced by an extractor, referring to entities by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedRelation {
    pub from: String,
    pub to: String,
    pub relation_type: String,
}

/// Full extractor output for one memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub entities: Vec<ExtractedEntity>,
    #[serde(default)]
    pub relations: Vec<ExtractedRelation>,
}
