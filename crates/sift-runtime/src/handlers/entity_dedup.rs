use std::sync::Arc;

use async_trait::async_trait;
use sift_core::TaskType;
use sift_graph::EntityGraphManager;
use sift_scheduler::{TaskContext, TaskFailure, TaskHandler};

use super::blocking;

/// Background bulk entity deduplication. Payload: `auto_merge` (default
/// true) and an optional `confidence_threshold`.
pub struct EntityDedupHandler {
    graph: Arc<EntityGraphManager>,
}

impl EntityDedupHandler {
    pub fn new(graph: Arc<EntityGraphManager>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl TaskHandler for EntityDedupHandler {
    fn task_type(&self) -> TaskType {
        TaskType::EntityDeduplication
    }

    async fn run(&self, ctx: TaskContext) -> Result<serde_json::Value, TaskFailure> {
        let payload = ctx.payload();
        let auto_merge = payload
            .get("auto_merge")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(true);
        let threshold = payload
            .get("confidence_threshold")
            .and_then(serde_json::Value::as_f64);

        let graph = Arc::clone(&self.graph);
        let report = blocking(move || graph.bulk_deduplicate(auto_merge, threshold)).await?;
        Ok(serde_json::to_value(report)?)
    }
}
