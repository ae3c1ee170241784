use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use sift_core::traits::{IEntityExtractor, IMemoryStore};
use sift_core::TaskType;
use sift_graph::EntityGraphManager;
use sift_scheduler::{TaskContext, TaskFailure, TaskHandler};
use tracing::{debug, instrument};

use super::{blocking, memory_id};

/// Runs the extractor over one memory and folds the result into the graph.
pub struct ExtractionHandler {
    store: Arc<dyn IMemoryStore>,
    extractor: Arc<dyn IEntityExtractor>,
    graph: Arc<EntityGraphManager>,
}

impl ExtractionHandler {
    pub fn new(
        store: Arc<dyn IMemoryStore>,
        extractor: Arc<dyn IEntityExtractor>,
        graph: Arc<EntityGraphManager>,
    ) -> Self {
        Self {
            store,
            extractor,
            graph,
        }
    }
}

#[async_trait]
impl TaskHandler for ExtractionHandler {
    fn task_type(&self) -> TaskType {
        TaskType::ExtractEntities
    }

    #[instrument(skip(self, ctx), fields(task_id = %ctx.id()))]
    async fn run(&self, ctx: TaskContext) -> Result<serde_json::Value, TaskFailure> {
        let memory_id = memory_id(&ctx)?;
        let store = Arc::clone(&self.store);
        let lookup = memory_id.clone();
        let Some(memory) = blocking(move || store.get_memory(&lookup)).await? else {
            debug!(%memory_id, "memory gone before extraction");
            return Ok(json!({ "memory_id": memory_id, "skipped": "memory_missing" }));
        };

        let extractor = Arc::clone(&self.extractor);
        let content = memory.content;
        let extraction = blocking(move || extractor.extract(&content)).await?;
        ctx.report_progress(0.5);

        let graph = Arc::clone(&self.graph);
        let report = blocking(move || graph.ingest_extraction(&memory_id, &extraction)).await?;
        Ok(serde_json::to_value(report)?)
    }
}
