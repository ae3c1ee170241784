//! Report types for bulk entity deduplication.

use serde::{Deserialize, Serialize};

use sift_core::models::{MergeStats, MergeStrategy};

use crate::detection::DetectionMethod;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedPair {
    pub primary_id: String,
    pub secondary_id: String,
    pub strategy: MergeStrategy,
    pub confidence: f64,
    pub stats: MergeStats,
}

/// Candidate left for a person to decide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewItem {
    pub primary_id: String,
    pub primary_name: String,
    pub secondary_id: String,
    pub secondary_name: String,
    pub confidence: f64,
    pub method: DetectionMethod,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkFailure {
    pub primary_id: String,
    pub secondary_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkDedupReport {
    pub candidates: usize,
    pub merged: Vec<MergedPair>,
    pub manual_review: Vec<ReviewItem>,
    /// Pairs whose two sides already resolve to the same entity.
    pub skipped: usize,
    pub failures: Vec<BulkFailure>,
}
