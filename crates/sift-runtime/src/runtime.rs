use std::sync::Arc;

use serde_json::json;
use sift_core::config::{EmbeddingConfig, SiftConfig};
use sift_core::errors::{EmbeddingError, SiftError, SiftResult};
use sift_core::models::{
    DedupOutcome, FusedRecommendation, MemoryMergeStrategy, MergeStats, MergeStrategy, NewMemory,
    SearchResponse, Task, TaskId, TaskPriority, TaskType,
};
use sift_core::traits::{IEmbeddingGateway, IGraphStore, IMemoryStore};
use sift_dedup::DeduplicationEngine;
use sift_delivery::{ContentDeliveryAdapter, PreparedContent};
use sift_graph::{BulkDedupReport, EntityGraphManager};
use sift_retrieval::RetrievalFusion;
use sift_scheduler::{HandlerRegistry, TaskHandle, TaskScheduler, TaskStats};
use sift_storage::StorageEngine;
use sift_tokens::TokenCounter;
use tracing::{info, instrument, warn};

use crate::handlers::{DuplicateSweepHandler, EmbeddingHandler, EntityDedupHandler, ExtractionHandler};
use crate::options::RuntimeOptions;

/// Result of [`SiftRuntime::create_memory`]: the dedup outcome plus the
/// background tasks scheduled for the written memory.
#[derive(Debug)]
pub struct CreatedMemory {
    pub outcome: DedupOutcome,
    pub tasks: Vec<TaskHandle>,
}

impl CreatedMemory {
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(TaskHandle::id).collect()
    }
}

/// Owns the store, every engine, and the task scheduler.
pub struct SiftRuntime {
    pub storage: Arc<StorageEngine>,
    pub dedup: Arc<DeduplicationEngine>,
    pub graph: Arc<EntityGraphManager>,
    pub retrieval: RetrievalFusion,
    pub delivery: ContentDeliveryAdapter,
    pub scheduler: TaskScheduler,
    pub config: SiftConfig,
}

impl SiftRuntime {
    /// Build every component and start the worker pool. Must be called from
    /// within a tokio runtime.
    pub fn start(opts: RuntimeOptions) -> SiftResult<Self> {
        let config = match &opts.config_toml {
            Some(toml_str) => SiftConfig::from_toml(toml_str)
                .map_err(|e| SiftError::ConfigError(e.to_string()))?,
            None => SiftConfig::default(),
        };
        if let Some(gateway) = &opts.gateway {
            check_gateway(&config.embedding, gateway.as_ref())?;
        }

        let storage = Arc::new(match &opts.db_path {
            Some(path) => StorageEngine::open(path)?,
            None => StorageEngine::open_in_memory()?,
        });
        let memories: Arc<dyn IMemoryStore> = storage.clone();
        let graph_store: Arc<dyn IGraphStore> = storage.clone();

        let mut dedup =
            DeduplicationEngine::new(memories.clone(), opts.gateway.clone(), config.dedup.clone());
        let mut graph =
            EntityGraphManager::new(graph_store.clone(), memories.clone(), config.entity.clone());
        if let Some(generator) = &opts.generator {
            dedup = dedup.with_generator(generator.clone());
            graph = graph.with_generator(generator.clone());
        }
        let dedup = Arc::new(dedup);
        let graph = Arc::new(graph);

        let retrieval = RetrievalFusion::new(
            memories.clone(),
            graph_store,
            opts.gateway.clone(),
            config.retrieval.clone(),
        );
        let delivery = ContentDeliveryAdapter::new(config.delivery.clone(), TokenCounter::default());

        let mut registry = HandlerRegistry::new();
        if let Some(gateway) = &opts.gateway {
            registry.register_handler(Arc::new(EmbeddingHandler::new(
                memories.clone(),
                gateway.clone(),
                config.scheduler.clone(),
            )))?;
        }
        if let Some(extractor) = &opts.extractor {
            registry.register_handler(Arc::new(ExtractionHandler::new(
                memories,
                extractor.clone(),
                graph.clone(),
            )))?;
        }
        registry.register_handler(Arc::new(DuplicateSweepHandler::new(dedup.clone())))?;
        registry.register_handler(Arc::new(EntityDedupHandler::new(graph.clone())))?;

        let scheduler = TaskScheduler::start(config.scheduler.clone(), registry);

        info!(
            persistent = opts.db_path.is_some(),
            embeddings = opts.gateway.is_some(),
            extraction = opts.extractor.is_some(),
            smart_merge = opts.generator.is_some(),
            "sift runtime started"
        );

        Ok(Self {
            storage,
            dedup,
            graph,
            retrieval,
            delivery,
            scheduler,
            config,
        })
    }

    /// Deduplicating write. When content was written, an embedding job is
    /// scheduled if the memory has no vector yet, and an extraction job if an
    /// extractor is configured. Returns without waiting for either.
    #[instrument(skip(self, request))]
    pub fn create_memory(
        &self,
        request: NewMemory,
        force: bool,
        strategy: MemoryMergeStrategy,
    ) -> SiftResult<CreatedMemory> {
        let outcome = self.dedup.create_with_dedup(request, force, strategy)?;
        let mut tasks = Vec::new();

        if let Some(memory_id) = outcome.written_id() {
            let payload = json!({ "memory_id": memory_id });
            let needs_embedding = self
                .storage
                .get_memory(memory_id)?
                .map_or(false, |m| m.embedding.is_none());

            if needs_embedding && self.handles(TaskType::GenerateEmbedding) {
                tasks.push(self.scheduler.add_task(
                    TaskType::GenerateEmbedding,
                    format!("embed {memory_id}"),
                    TaskPriority::Normal,
                    payload.clone(),
                )?);
            }
            if self.handles(TaskType::ExtractEntities) {
                tasks.push(self.scheduler.add_task(
                    TaskType::ExtractEntities,
                    format!("extract {memory_id}"),
                    TaskPriority::Low,
                    payload,
                )?);
            }
        }

        Ok(CreatedMemory { outcome, tasks })
    }

    pub fn search(&self, query: &str, context: Option<&str>, limit: usize) -> SiftResult<SearchResponse> {
        self.retrieval.search(query, context, limit)
    }

    pub fn get_recommendations(
        &self,
        memory_id: &str,
        limit: usize,
    ) -> SiftResult<Vec<FusedRecommendation>> {
        self.retrieval.get_recommendations(memory_id, limit)
    }

    pub fn prepare_content_for_model(&self, content: &str, model: &str) -> PreparedContent {
        self.delivery.prepare_content_for_model(content, model)
    }

    pub fn merge_entities(
        &self,
        primary_id: &str,
        secondary_id: &str,
        strategy: MergeStrategy,
    ) -> SiftResult<MergeStats> {
        self.graph.merge_entities(primary_id, secondary_id, strategy)
    }

    pub fn bulk_deduplicate(
        &self,
        auto_merge: bool,
        confidence_threshold: Option<f64>,
    ) -> SiftResult<BulkDedupReport> {
        self.graph.bulk_deduplicate(auto_merge, confidence_threshold)
    }

    /// Queue an exact-duplicate sweep, optionally limited to one context.
    pub fn schedule_duplicate_sweep(&self, context: Option<&str>) -> SiftResult<TaskHandle> {
        Ok(self.scheduler.add_task(
            TaskType::ExactDuplicateSweep,
            "exact duplicate sweep",
            TaskPriority::Low,
            json!({ "context": context }),
        )?)
    }

    /// Queue a bulk entity deduplication pass.
    pub fn schedule_entity_deduplication(
        &self,
        auto_merge: bool,
        confidence_threshold: Option<f64>,
    ) -> SiftResult<TaskHandle> {
        Ok(self.scheduler.add_task(
            TaskType::EntityDeduplication,
            "entity deduplication",
            TaskPriority::Low,
            json!({
                "auto_merge": auto_merge,
                "confidence_threshold": confidence_threshold,
            }),
        )?)
    }

    pub fn task(&self, id: TaskId) -> SiftResult<Task> {
        Ok(self.scheduler.get_task(id)?)
    }

    pub fn task_stats(&self) -> TaskStats {
        self.scheduler.stats()
    }

    /// Stop background work. Pending and running tasks are cancelled.
    pub async fn shutdown(&self) {
        self.scheduler.stop().await;
        info!("sift runtime shut down");
    }

    fn handles(&self, task_type: TaskType) -> bool {
        self.scheduler.handles(task_type)
    }
}

/// Vectors are compared across the whole store, so the gateway must produce
/// the configured dimension. A differing model name is only logged.
fn check_gateway(config: &EmbeddingConfig, gateway: &dyn IEmbeddingGateway) -> SiftResult<()> {
    if gateway.dimensions() != config.dimensions {
        return Err(EmbeddingError::DimensionMismatch {
            expected: config.dimensions,
            actual: gateway.dimensions(),
        }
        .into());
    }
    if gateway.model_name() != config.model {
        warn!(
            configured = %config.model,
            gateway = gateway.model_name(),
            "embedding gateway model differs from configuration"
        );
    }
    Ok(())
}
