use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_CONTEXT;

/// A stored text record. The store owns the row; the core reads it and
/// patches individual columns (content, embedding, extraction flag).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// UUID v4 identifier.
    pub id: String,
    pub content: String,
    pub title: Option<String>,
    pub tags: Vec<String>,
    /// Document-mode embedding, absent until the background job fills it.
    pub embedding: Option<Vec<f32>>,
    /// Model that produced `embedding`.
    pub embedding_model: Option<String>,
    /// Context partition isolating this memory from other projects/tenants.
    pub context: String,
    /// Platform the memory was captured from, if known.
    pub platform: Option<String>,
    /// blake3 hash of the normalized content.
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Whether entity extraction has run for the current content.
    pub extracted: bool,
}

impl PartialEq for MemoryRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl MemoryRecord {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// First `max_chars` characters of the content.
    pub fn preview(&self, max_chars: usize) -> String {
        self.content.chars().take(max_chars).collect()
    }
}

/// Caller-supplied fields for a new memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewMemory {
    pub content: String,
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub context: Option<String>,
    pub platform: Option<String>,
}

impl NewMemory {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    /// Context partition, falling back to the default partition.
    pub fn context_or_default(&self) -> &str {
        self.context.as_deref().unwrap_or(DEFAULT_CONTEXT)
    }

    /// Materialize a record with a fresh id and the given creation time.
    pub fn into_record(self, now: DateTime<Utc>) -> MemoryRecord {
        let context = self.context_or_default().to_string();
        let hash = content_hash(&self.content);
        MemoryRecord {
            id: uuid::Uuid::new_v4().to_string(),
            content: self.content,
            title: self.title,
            tags: self.tags,
            embedding: None,
            embedding_model: None,
            context,
            platform: self.platform,
            content_hash: hash,
            created_at: now,
            updated_at: now,
            extracted: false,
        }
    }
}

/// Lower-case and collapse every whitespace run to a single space.
pub fn normalize_content(content: &str) -> String {
    content
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// blake3 hash of the normalized content, hex encoded.
pub fn content_hash(content: &str) -> String {
    blake3::hash(normalize_content(content).as_bytes())
        .to_hex()
        .to_string()
}
