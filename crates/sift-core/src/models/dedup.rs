use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::SiftError;

/// Transient near-duplicate match. Only used to choose the write path.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateCandidate {
    pub memory_id: String,
    /// Cosine similarity, 0.0–1.0.
    pub similarity: f64,
    pub created_at: DateTime<Utc>,
}

impl DuplicateCandidate {
    /// Similarity as a percentage rounded to one decimal place.
    pub fn similarity_percent(&self) -> f64 {
        (self.similarity * 1000.0).round() / 10.0
    }
}

/// How new content is folded into an existing memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryMergeStrategy {
    /// Existing content, a timestamped separator, then the new content.
    #[default]
    Append,
    /// New content replaces the existing content.
    Replace,
    /// A generative step reconciles both texts; falls back to `Append`.
    Smart,
}

impl fmt::Display for MemoryMergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Append => "append",
            Self::Replace => "replace",
            Self::Smart => "smart",
        })
    }
}

impl FromStr for MemoryMergeStrategy {
    type Err = SiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "append" => Ok(Self::Append),
            "replace" => Ok(Self::Replace),
            "smart" => Ok(Self::Smart),
            other => Err(SiftError::InvalidArgument {
                reason: format!("unknown memory merge strategy: {other}"),
            }),
        }
    }
}

/// What the caller may do about a reported duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateOption {
    /// Fold the new content into the existing memory.
    Update,
    /// Write the new memory anyway.
    Force,
    /// Drop the new content.
    Skip,
}

/// Data returned instead of writing when a near-duplicate exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateDecision {
    pub existing_id: String,
    /// Percentage, one decimal place.
    pub similarity: f64,
    pub existing_created_at: DateTime<Utc>,
    pub existing_preview: String,
    pub options: Vec<DuplicateOption>,
}

/// Result of a deduplicating write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DedupOutcome {
    Created {
        memory_id: String,
    },
    Merged {
        memory_id: String,
        /// Percentage, one decimal place.
        similarity: f64,
        strategy: MemoryMergeStrategy,
    },
    DuplicateFound(DuplicateDecision),
}

impl DedupOutcome {
    /// Id of the memory that now holds the content, if anything was written.
    pub fn written_id(&self) -> Option<&str> {
        match self {
            Self::Created { memory_id } | Self::Merged { memory_id, .. } => Some(memory_id),
            Self::DuplicateFound(_) => None,
        }
    }

    pub fn is_duplicate_found(&self) -> bool {
        matches!(self, Self::DuplicateFound(_))
    }
}

/// Memories sharing one normalized content hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExactDuplicateGroup {
    pub content_hash: String,
    pub count: usize,
    /// Member ids, oldest first.
    pub memory_ids: Vec<String>,
    pub first_created: DateTime<Utc>,
    pub last_created: DateTime<Utc>,
}

impl ExactDuplicateGroup {
    /// Time between the first and last member.
    pub fn span(&self) -> chrono::Duration {
        self.last_created - self.first_created
    }
}
