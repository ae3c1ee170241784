use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error};

use crate::context::TaskContext;
use crate::state::{Dispatch, Outcome, Shared};

/// Periodically drop finished tasks older than the retention period.
pub(crate) async fn purge_loop(shared: Arc<Shared>) {
    let every = Duration::from_millis(shared.config.purge_interval_ms.max(1));
    let retention = i64::try_from(shared.config.finished_retention_secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX);

    while !shared.is_stopped() {
        tokio::time::sleep(every).await;
        let Some(cutoff) = Utc::now().checked_sub_signed(retention) else {
            continue;
        };
        let purged = shared.purge_finished(cutoff);
        if purged > 0 {
            debug!(purged, "purged finished tasks");
        }
    }
}

pub(crate) async fn run(worker_id: usize, shared: Arc<Shared>) {
    let idle = Duration::from_millis(shared.config.idle_poll_ms.max(1));
    debug!(worker_id, "worker started");

    while !shared.is_stopped() {
        match shared.dequeue() {
            Some(dispatch) => execute(&shared, dispatch).await,
            None => {
                tokio::select! {
                    _ = shared.wake.notified() => {}
                    _ = tokio::time::sleep(idle) => {}
                }
            }
        }
    }

    debug!(worker_id, "worker exited");
}

/// Run one handler in its own task so panics and aborts are contained.
async fn execute(shared: &Arc<Shared>, dispatch: Dispatch) {
    let Dispatch {
        id,
        task_type,
        payload,
        handler,
    } = dispatch;
    debug!(task_id = %id, task_type = %task_type, "task started");

    let ctx = TaskContext::new(id, task_type, payload, Arc::clone(shared));
    let join = tokio::spawn(async move { handler.run(ctx).await });
    shared.track_running(id, join.abort_handle());

    let outcome = match join.await {
        Ok(Ok(value)) => Outcome::Completed(value),
        Ok(Err(failure)) => Outcome::Failed {
            error: failure.error,
            trace: failure.trace,
        },
        Err(e) if e.is_cancelled() => Outcome::Cancelled,
        Err(e) => {
            let detail = panic_message(e.into_panic());
            error!(task_id = %id, task_type = %task_type, %detail, "task handler panicked");
            Outcome::Failed {
                error: "task handler panicked".to_string(),
                trace: Some(detail),
            }
        }
    };

    shared.untrack_running(id);
    shared.finish(id, outcome);
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
