//! Data model shared by every crate.

mod dedup;
mod entity;
mod memory;
mod retrieval;
mod task;

pub use dedup::{
    DedupOutcome, DuplicateCandidate, DuplicateDecision, DuplicateOption, ExactDuplicateGroup,
    MemoryMergeStrategy,
};
pub use entity::{
    Entity, EntityForward, ExtractedEntity, ExtractedRelation, ExtractionResult,
    MemoryEntityAssociation, MergeHistoryEntry, MergePlan, MergeStats, MergeStrategy, Relation,
};
pub use memory::{content_hash, normalize_content, MemoryRecord, NewMemory};
pub use retrieval::{
    Degradation, EntitySearchHit, EntitySearchResult, FusedRecommendation, RankedHit,
    SearchResponse, StrategyHit, StrategyKind,
};
pub use task::{Task, TaskId, TaskPriority, TaskStatus, TaskType};
