//! Background task handlers registered by the runtime.

mod embedding;
mod entity_dedup;
mod extraction;
mod sweep;

pub use embedding::EmbeddingHandler;
pub use entity_dedup::EntityDedupHandler;
pub use extraction::ExtractionHandler;
pub use sweep::DuplicateSweepHandler;

use sift_core::errors::SiftResult;
use sift_scheduler::{TaskContext, TaskFailure};

/// Run synchronous store or provider work off the async workers.
pub(crate) async fn blocking<T, F>(job: F) -> Result<T, TaskFailure>
where
    F: FnOnce() -> SiftResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(result) => result.map_err(TaskFailure::from),
        Err(e) => Err(TaskFailure::new(format!("blocking job did not finish: {e}"))),
    }
}

/// The `memory_id` every per-memory task carries.
pub(crate) fn memory_id(ctx: &TaskContext) -> Result<String, TaskFailure> {
    ctx.payload_str("memory_id")
        .map(str::to_string)
        .ok_or_else(|| TaskFailure::new("payload is missing memory_id"))
}
