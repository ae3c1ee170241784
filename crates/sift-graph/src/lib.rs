//! # sift-graph
//!
//! Entity graph maintenance on top of [`IGraphStore`](sift_core::traits::IGraphStore):
//! duplicate detection (exact, fuzzy, generator-assisted alias grouping),
//! transactional merges with a forwarding index, per-entity timelines, bulk
//! deduplication and ingestion of extractor output.

pub mod bulk;
pub mod detection;
pub mod ingest;
mod manager;
pub mod merge_plan;
pub mod timeline;

pub use bulk::{BulkDedupReport, BulkFailure, MergedPair, ReviewItem};
pub use detection::{DetectionMethod, DuplicatePair};
pub use ingest::IngestReport;
pub use manager::EntityGraphManager;
pub use timeline::{EntityTimeline, TimelineEvent, TimelineEventKind};
