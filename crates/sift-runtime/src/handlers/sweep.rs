use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use sift_core::TaskType;
use sift_dedup::DeduplicationEngine;
use sift_scheduler::{TaskContext, TaskFailure, TaskHandler};
use tracing::info;

use super::blocking;

/// Periodic safety net for the create-time dedup race: reports groups of
/// memories whose normalized content is identical.
pub struct DuplicateSweepHandler {
    dedup: Arc<DeduplicationEngine>,
}

impl DuplicateSweepHandler {
    pub fn new(dedup: Arc<DeduplicationEngine>) -> Self {
        Self { dedup }
    }
}

#[async_trait]
impl TaskHandler for DuplicateSweepHandler {
    fn task_type(&self) -> TaskType {
        TaskType::ExactDuplicateSweep
    }

    async fn run(&self, ctx: TaskContext) -> Result<serde_json::Value, TaskFailure> {
        let context = ctx.payload_str("context").map(str::to_string);
        let dedup = Arc::clone(&self.dedup);
        let scope = context.clone();
        let groups = blocking(move || dedup.find_exact_duplicates(scope.as_deref(), None)).await?;

        let redundant: usize = groups.iter().map(|g| g.count.saturating_sub(1)).sum();
        if !groups.is_empty() {
            info!(groups = groups.len(), redundant, context = ?context, "exact duplicates found");
        }
        Ok(json!({
            "context": context,
            "redundant": redundant,
            "groups": groups,
        }))
    }
}
