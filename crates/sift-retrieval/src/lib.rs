//! # sift-retrieval
//!
//! Ranks memories from independent signals and fuses them:
//! - recommendations for a source memory from four strategies (entity,
//!   relation, content, temporal) combined with fixed weights
//! - hybrid keyword + semantic search with graceful loss of the semantic side
//! - reciprocal rank fusion over arbitrary ranked lists
//! - lookup of memories by entity name

mod engine;
pub mod entity_search;
pub mod fusion;
pub mod hybrid;
pub mod relation_graph;
pub mod rrf;
pub mod strategies;

pub use engine::RetrievalFusion;
pub use fusion::fuse_strategies;
pub use hybrid::combine_scores;
pub use rrf::reciprocal_rank_fusion;
