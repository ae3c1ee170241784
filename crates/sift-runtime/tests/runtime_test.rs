//! SiftRuntime end to end: deduplicating writes, background handlers, shutdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use sift_core::errors::{EmbeddingError, SiftError, TaskError};
use sift_core::models::{
    DedupOutcome, Entity, MemoryMergeStrategy, NewMemory, Task, TaskStatus,
};
use sift_core::traits::{IEmbeddingGateway, IEntityExtractor, IGraphStore, IMemoryStore};
use sift_delivery::DeliveryStrategy;
use sift_runtime::{RuntimeOptions, SiftRuntime};
use sift_scheduler::TaskHandle;
use test_fixtures::mocks::{MockExtractor, MockGateway};

const FAST_RETRIES: &str = r#"
[embedding]
model = "mock-embedding"
dimensions = 16

[scheduler]
workers = 2
idle_poll_ms = 10
max_attempts = 3
retry_base_ms = 1
retry_max_ms = 5
"#;

fn options() -> RuntimeOptions {
    RuntimeOptions::in_memory().with_config_toml(FAST_RETRIES)
}

fn with_gateway(gateway: &Arc<MockGateway>) -> RuntimeOptions {
    let shared: Arc<dyn IEmbeddingGateway> = gateway.clone();
    options().with_gateway(shared)
}

async fn finished(handle: TaskHandle) -> Task {
    tokio::time::timeout(Duration::from_secs(10), handle.wait())
        .await
        .expect("task did not finish in time")
        .unwrap()
}

fn created_id(outcome: &DedupOutcome) -> String {
    outcome.written_id().expect("memory was written").to_string()
}

// ── Embedding jobs ──

#[tokio::test]
async fn embedding_job_fills_vector_once_provider_recovers() {
    let gateway = Arc::new(MockGateway::new(16));
    gateway.set_available(false);
    let rt = SiftRuntime::start(with_gateway(&gateway)).unwrap();

    let created = rt
        .create_memory(NewMemory::new("rust ownership rules"), false, MemoryMergeStrategy::Append)
        .unwrap();
    let id = created_id(&created.outcome);
    assert_eq!(created.tasks.len(), 1);

    gateway.set_available(true);
    let task = finished(created.tasks.into_iter().next().unwrap()).await;
    assert_eq!(task.status, TaskStatus::Completed);
    let result = task.result.unwrap();
    assert_eq!(result["dimensions"], 16);
    assert_eq!(result["model"], "mock-embedding");

    let stored = rt.storage.get_memory(&id).unwrap().unwrap();
    assert_eq!(stored.embedding.map(|v| v.len()), Some(16));
    assert_eq!(stored.embedding_model.as_deref(), Some("mock-embedding"));
    rt.shutdown().await;
}

#[tokio::test]
async fn embedding_job_gives_up_with_attempt_history() {
    let gateway = Arc::new(MockGateway::new(16));
    gateway.set_available(false);
    let rt = SiftRuntime::start(with_gateway(&gateway)).unwrap();

    let created = rt
        .create_memory(NewMemory::new("never embedded"), false, MemoryMergeStrategy::Append)
        .unwrap();
    let task = finished(created.tasks.into_iter().next().unwrap()).await;

    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.error.as_deref(), Some("embedding failed after 3 attempts"));
    let trace = task.trace.unwrap();
    assert_eq!(trace.lines().count(), 3);
    assert!(trace.starts_with("attempt 1: embedding provider mock-embedding unavailable"));
    rt.shutdown().await;
}

#[tokio::test]
async fn vector_computed_at_create_skips_embedding_job() {
    let gateway = Arc::new(MockGateway::new(16));
    let rt = SiftRuntime::start(with_gateway(&gateway)).unwrap();

    let created = rt
        .create_memory(NewMemory::new("cache eviction policy"), false, MemoryMergeStrategy::Append)
        .unwrap();
    assert!(created.tasks.is_empty());
    let stored = rt.storage.get_memory(&created_id(&created.outcome)).unwrap().unwrap();
    assert!(stored.embedding.is_some());
    rt.shutdown().await;
}

#[tokio::test]
async fn duplicate_found_schedules_nothing() {
    let gateway = Arc::new(MockGateway::new(16));
    let extractor: Arc<dyn IEntityExtractor> = Arc::new(MockExtractor::new());
    let rt = SiftRuntime::start(with_gateway(&gateway).with_extractor(extractor)).unwrap();

    let first = rt
        .create_memory(NewMemory::new("deploy on fridays"), false, MemoryMergeStrategy::Append)
        .unwrap();
    assert_eq!(first.tasks.len(), 1);

    let second = rt
        .create_memory(NewMemory::new("deploy on fridays"), false, MemoryMergeStrategy::Append)
        .unwrap();
    assert!(second.outcome.is_duplicate_found());
    assert!(second.tasks.is_empty());
    rt.shutdown().await;
}

// ── Extraction jobs ──

#[tokio::test]
async fn extraction_job_populates_entity_graph() {
    let content = "Postgres tuning notes for the billing service";
    let extractor = Arc::new(MockExtractor::new());
    extractor.answer(
        content,
        &[("PostgreSQL", "technology", 0.9), ("Billing", "service", 0.7)],
        &[("Billing", "PostgreSQL", "uses")],
    );
    let shared: Arc<dyn IEntityExtractor> = extractor.clone();
    let rt = SiftRuntime::start(options().with_extractor(shared)).unwrap();

    let created = rt
        .create_memory(NewMemory::new(content), false, MemoryMergeStrategy::Append)
        .unwrap();
    let id = created_id(&created.outcome);
    assert_eq!(created.tasks.len(), 1);

    let task = finished(created.tasks.into_iter().next().unwrap()).await;
    assert_eq!(task.status, TaskStatus::Completed);
    let report = task.result.unwrap();
    assert_eq!(report["entities_created"], 2);
    assert_eq!(report["relations_added"], 1);

    let lookup = rt.retrieval.search_by_entity("postgresql").unwrap();
    assert!(lookup.found);
    assert_eq!(lookup.memories[0].memory_id, id);
    assert!(rt.storage.get_memory(&id).unwrap().unwrap().extracted);
    rt.shutdown().await;
}

// ── Maintenance jobs ──

#[tokio::test]
async fn duplicate_sweep_reports_forced_copies() {
    let rt = SiftRuntime::start(options()).unwrap();
    for _ in 0..2 {
        rt.create_memory(NewMemory::new("Same words."), true, MemoryMergeStrategy::Append)
            .unwrap();
    }
    rt.create_memory(NewMemory::new("different words"), true, MemoryMergeStrategy::Append)
        .unwrap();

    let task = finished(rt.schedule_duplicate_sweep(None).unwrap()).await;
    assert_eq!(task.status, TaskStatus::Completed);
    let result = task.result.unwrap();
    assert_eq!(result["redundant"], 1);
    assert_eq!(result["groups"].as_array().unwrap().len(), 1);
    assert_eq!(result["groups"][0]["count"], 2);
    rt.shutdown().await;
}

#[tokio::test]
async fn entity_dedup_job_merges_confident_pairs() {
    let rt = SiftRuntime::start(options()).unwrap();
    let now = Utc::now();
    let primary = Entity::new("PostgreSQL", "technology", now - chrono::Duration::seconds(10));
    let secondary = Entity::new("PostgreSQLs", "technology", now);
    rt.storage.insert_entity(&primary).unwrap();
    rt.storage.insert_entity(&secondary).unwrap();

    let task = finished(rt.schedule_entity_deduplication(true, None).unwrap()).await;
    assert_eq!(task.status, TaskStatus::Completed);
    let report = task.result.unwrap();
    assert_eq!(report["merged"].as_array().unwrap().len(), 1);
    assert_eq!(
        rt.graph.resolve_entity_id(&secondary.id).unwrap().as_deref(),
        Some(primary.id.as_str())
    );
    rt.shutdown().await;
}

// ── Delivery ──

#[tokio::test]
async fn delivery_uses_model_budget() {
    let rt = SiftRuntime::start(options()).unwrap();
    let large = rt.prepare_content_for_model("short note", "gpt-4o");
    assert_eq!(large.strategy, DeliveryStrategy::Full);

    let unknown = rt.prepare_content_for_model("short note", "some-local-model");
    assert_eq!(unknown.budget, 4_000);
    assert_eq!(unknown.strategy, DeliveryStrategy::Summary);
    rt.shutdown().await;
}

// ── Lifecycle ──

#[tokio::test]
async fn invalid_config_is_rejected() {
    let result = SiftRuntime::start(RuntimeOptions::in_memory().with_config_toml("scheduler = 5"));
    assert!(matches!(result, Err(SiftError::ConfigError(_))));
}

#[tokio::test]
async fn gateway_dimension_must_match_configuration() {
    let gateway = Arc::new(MockGateway::new(8));
    let err = SiftRuntime::start(with_gateway(&gateway)).err().expect("start must fail");
    assert!(matches!(
        err,
        SiftError::EmbeddingError(EmbeddingError::DimensionMismatch { expected: 16, actual: 8 })
    ));

    // without a gateway there is nothing to check
    assert!(SiftRuntime::start(options()).is_ok());
}

#[tokio::test]
async fn shutdown_is_idempotent_and_rejects_new_work() {
    let rt = SiftRuntime::start(options()).unwrap();
    rt.shutdown().await;
    rt.shutdown().await;

    let err = rt.schedule_duplicate_sweep(Some("default")).unwrap_err();
    assert!(matches!(err, SiftError::TaskError(TaskError::SchedulerStopped)));
    assert_eq!(rt.task_stats().total(), 0);
}

#[tokio::test]
async fn memories_survive_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sift.db");

    let rt = SiftRuntime::start(options().with_db_path(&path)).unwrap();
    let created = rt
        .create_memory(NewMemory::new("persisted note"), false, MemoryMergeStrategy::Append)
        .unwrap();
    let id = created_id(&created.outcome);
    rt.shutdown().await;
    drop(rt);

    let reopened = SiftRuntime::start(options().with_db_path(&path)).unwrap();
    let stored = reopened.storage.get_memory(&id).unwrap().unwrap();
    assert_eq!(stored.content, "persisted note");
    reopened.shutdown().await;
}
