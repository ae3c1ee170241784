//! # sift-delivery
//!
//! Adapts content length and granularity to a consumer model's capacity.
//!
//! - [`budget`]: per-model token budgets and the full / smart_chunk / summary decision
//! - [`truncate`]: head or tail truncation with exact or estimated precision
//! - [`chunker`]: lossless delimiter-hierarchy chunking with overlap prefixes
//! - [`windows`]: fixed-stride embedding windows and hierarchical chunk sets
//! - [`adapter`]: [`ContentDeliveryAdapter`] tying the above to `DeliveryConfig`

pub mod adapter;
pub mod budget;
pub mod chunker;
pub mod truncate;
pub mod windows;

pub use adapter::{ContentDeliveryAdapter, DeliveredContent, PreparedContent};
pub use budget::{DeliveryStrategy, ModelBudgets};
pub use chunker::Chunk;
pub use truncate::{Precision, TruncationResult};
pub use windows::{ChunkLevel, EmbeddingWindow};
