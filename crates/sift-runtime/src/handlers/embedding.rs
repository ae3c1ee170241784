use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use sift_core::config::SchedulerConfig;
use sift_core::models::MemoryRecord;
use sift_core::similarity::ensure_dimensions;
use sift_core::traits::{IEmbeddingGateway, IMemoryStore};
use sift_core::TaskType;
use sift_scheduler::{TaskContext, TaskFailure, TaskHandler};
use tracing::{debug, info, instrument, warn};

use super::{blocking, memory_id};

enum Attempt {
    Retry(String),
    Fatal(TaskFailure),
}

/// Fills in the document embedding of one memory. Provider errors are
/// retried with exponential backoff; a wrong vector size is not.
pub struct EmbeddingHandler {
    store: Arc<dyn IMemoryStore>,
    gateway: Arc<dyn IEmbeddingGateway>,
    config: SchedulerConfig,
}

impl EmbeddingHandler {
    pub fn new(
        store: Arc<dyn IMemoryStore>,
        gateway: Arc<dyn IEmbeddingGateway>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            config,
        }
    }

    async fn attempt(&self, memory: &MemoryRecord) -> Result<usize, Attempt> {
        if !self.gateway.is_available() {
            return Err(Attempt::Retry(format!(
                "embedding provider {} unavailable",
                self.gateway.model_name()
            )));
        }

        let gateway = Arc::clone(&self.gateway);
        let texts = vec![memory.content.clone()];
        let mut vectors = match tokio::task::spawn_blocking(move || gateway.embed_texts(&texts)).await
        {
            Ok(Ok(vectors)) => vectors,
            Ok(Err(e)) => return Err(Attempt::Retry(e.to_string())),
            Err(e) => return Err(Attempt::Retry(e.to_string())),
        };
        let vector = vectors
            .pop()
            .ok_or_else(|| Attempt::Retry("gateway returned no vector".to_string()))?;
        ensure_dimensions(&vector, self.gateway.dimensions())
            .map_err(|e| Attempt::Fatal(TaskFailure::from(e)))?;

        let dimensions = vector.len();
        let store = Arc::clone(&self.store);
        let id = memory.id.clone();
        let model = self.gateway.model_name().to_string();
        blocking(move || store.set_embedding(&id, &vector, &model))
            .await
            .map_err(Attempt::Fatal)?;
        Ok(dimensions)
    }
}

#[async_trait]
impl TaskHandler for EmbeddingHandler {
    fn task_type(&self) -> TaskType {
        TaskType::GenerateEmbedding
    }

    #[instrument(skip(self, ctx), fields(task_id = %ctx.id()))]
    async fn run(&self, ctx: TaskContext) -> Result<serde_json::Value, TaskFailure> {
        let memory_id = memory_id(&ctx)?;
        let store = Arc::clone(&self.store);
        let lookup = memory_id.clone();
        let Some(memory) = blocking(move || store.get_memory(&lookup)).await? else {
            debug!(%memory_id, "memory gone before embedding");
            return Ok(json!({ "memory_id": memory_id, "skipped": "memory_missing" }));
        };
        if memory.embedding.is_some() {
            return Ok(json!({ "memory_id": memory_id, "skipped": "already_embedded" }));
        }

        let max_attempts = self.config.max_attempts.max(1);
        let mut history = Vec::new();
        for attempt in 1..=max_attempts {
            if ctx.is_stopping() {
                history.push(format!("attempt {attempt}: scheduler stopping"));
                break;
            }
            match self.attempt(&memory).await {
                Ok(dimensions) => {
                    info!(%memory_id, attempt, dimensions, "embedding stored");
                    return Ok(json!({
                        "memory_id": memory_id,
                        "dimensions": dimensions,
                        "model": self.gateway.model_name(),
                        "attempts": attempt,
                    }));
                }
                Err(Attempt::Fatal(failure)) => {
                    history.push(format!("attempt {attempt}: {}", failure.error));
                    return Err(failure.with_trace(history.join("\n")));
                }
                Err(Attempt::Retry(reason)) => {
                    history.push(format!("attempt {attempt}: {reason}"));
                    ctx.report_progress(f64::from(attempt) / f64::from(max_attempts));
                    if attempt < max_attempts {
                        let delay = self.config.backoff_ms(attempt);
                        debug!(%memory_id, attempt, delay_ms = delay, %reason, "embedding retry scheduled");
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                    }
                }
            }
        }

        warn!(%memory_id, attempts = history.len(), "giving up on embedding");
        Err(TaskFailure::new(format!(
            "embedding failed after {} attempts",
            history.len()
        ))
        .with_trace(history.join("\n")))
    }
}
