use chrono::{DateTime, Utc};

use crate::errors::SiftResult;
use crate::models::{
    Entity, MemoryEntityAssociation, MemoryRecord, MergeHistoryEntry, MergePlan, MergeStats,
    Relation,
};

/// Memory rows: create, read, patch individual columns, similarity and text queries.
pub trait IMemoryStore: Send + Sync {
    // --- CRUD ---
    fn insert_memory(&self, memory: &MemoryRecord) -> SiftResult<()>;
    fn get_memory(&self, id: &str) -> SiftResult<Option<MemoryRecord>>;
    fn get_memories(&self, ids: &[String]) -> SiftResult<Vec<MemoryRecord>>;

    // --- Column patches ---
    /// Replace content and tags. Clears the embedding and extraction flag.
    fn update_content(
        &self,
        id: &str,
        content: &str,
        tags: &[String],
        updated_at: DateTime<Utc>,
    ) -> SiftResult<()>;
    fn set_embedding(&self, id: &str, embedding: &[f32], model: &str) -> SiftResult<()>;
    fn mark_extracted(&self, id: &str) -> SiftResult<()>;

    // --- Query ---
    /// Memories of a context created at or after `since` that have an embedding.
    fn recent_with_embeddings(
        &self,
        context: &str,
        since: DateTime<Utc>,
    ) -> SiftResult<Vec<MemoryRecord>>;
    /// All memories of a context that have an embedding.
    fn embedded_in_context(&self, context: &str) -> SiftResult<Vec<MemoryRecord>>;
    /// Memories created in `[from, to]`, optionally restricted to one context, oldest first.
    fn memories_between(
        &self,
        context: Option<&str>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> SiftResult<Vec<MemoryRecord>>;

    // --- Search ---
    /// Full-text match. Scores are higher-is-better and only comparable within one call.
    fn search_text(
        &self,
        query: &str,
        context: Option<&str>,
        limit: usize,
    ) -> SiftResult<Vec<(MemoryRecord, f64)>>;
    /// Brute-force cosine scan over stored embeddings, best first.
    /// A stored vector of a different dimension is a hard error.
    fn search_vector(
        &self,
        query: &[f32],
        context: Option<&str>,
        limit: usize,
    ) -> SiftResult<Vec<(MemoryRecord, f64)>>;
}

/// Entity graph rows: entities, associations, relations, merge audit.
pub trait IGraphStore: Send + Sync {
    // --- Entities ---
    fn insert_entity(&self, entity: &Entity) -> SiftResult<()>;
    fn update_entity(&self, entity: &Entity) -> SiftResult<()>;
    fn get_entity(&self, id: &str) -> SiftResult<Option<Entity>>;
    fn list_entities(&self) -> SiftResult<Vec<Entity>>;
    /// Case-insensitive match on canonical name or alias.
    fn find_entities_by_name(&self, name: &str) -> SiftResult<Vec<Entity>>;

    // --- Associations ---
    /// Replace every association of a memory in one transaction.
    fn replace_associations(
        &self,
        memory_id: &str,
        associations: &[MemoryEntityAssociation],
    ) -> SiftResult<()>;
    fn associations_for_memory(&self, memory_id: &str) -> SiftResult<Vec<MemoryEntityAssociation>>;
    fn associations_for_entities(
        &self,
        entity_ids: &[String],
    ) -> SiftResult<Vec<MemoryEntityAssociation>>;

    // --- Relations ---
    /// Insert an edge. Returns false if the (from, to, type) triple already exists.
    fn add_relation(&self, relation: &Relation) -> SiftResult<bool>;
    /// Edges with either endpoint in `entity_ids`.
    fn relations_touching(&self, entity_ids: &[String]) -> SiftResult<Vec<Relation>>;

    // --- Merge ---
    /// Execute a merge in one transaction: rewrite the survivor, redirect
    /// associations and edges (skipping duplicates), append history, retire
    /// the secondary and record its forwarding entry.
    fn apply_merge(&self, plan: &MergePlan) -> SiftResult<MergeStats>;
    fn merge_history_for(&self, entity_id: &str) -> SiftResult<Vec<MergeHistoryEntry>>;
    /// One forwarding step for a retired id, if any.
    fn forwarded_to(&self, retired_id: &str) -> SiftResult<Option<String>>;
}
