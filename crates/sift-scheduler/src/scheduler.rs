use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sift_core::config::SchedulerConfig;
use sift_core::errors::TaskError;
use sift_core::models::{Task, TaskId, TaskPriority, TaskStatus, TaskType};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

use crate::context::TaskSubmitter;
use crate::handle::TaskHandle;
use crate::registry::HandlerRegistry;
use crate::state::Shared;
use crate::worker;

/// Task counts per status, plus how many ids are still queued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub queued: usize,
}

impl TaskStats {
    pub fn total(&self) -> usize {
        self.pending + self.running + self.completed + self.failed + self.cancelled
    }
}

/// Fixed worker pool draining four priority queues.
///
/// Owned by the composition root; there is no global instance. Dropping the
/// scheduler without calling [`stop`](Self::stop) aborts running handlers and
/// lets workers exit on their next poll.
pub struct TaskScheduler {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    purger: Option<JoinHandle<()>>,
}

impl TaskScheduler {
    /// Spawn `config.workers` workers on the current tokio runtime.
    pub fn start(config: SchedulerConfig, registry: HandlerRegistry) -> Self {
        let worker_count = config.workers.max(1);
        let shared = Arc::new(Shared::new(config, registry));
        let workers = (0..worker_count)
            .map(|worker_id| tokio::spawn(worker::run(worker_id, Arc::clone(&shared))))
            .collect();
        let purger = (shared.config.purge_interval_ms > 0)
            .then(|| tokio::spawn(worker::purge_loop(Arc::clone(&shared))));

        info!(
            workers = worker_count,
            handlers = ?shared.registered_types(),
            "task scheduler started"
        );

        Self {
            shared,
            workers: Mutex::new(workers),
            purger,
        }
    }

    /// Enqueue a task. Fails immediately when no handler serves `task_type`
    /// or the scheduler is stopped.
    pub fn add_task(
        &self,
        task_type: TaskType,
        name: impl Into<String>,
        priority: TaskPriority,
        payload: serde_json::Value,
    ) -> Result<TaskHandle, TaskError> {
        self.shared
            .enqueue(task_type, name.into(), priority, payload)
    }

    /// Whether a handler is registered for `task_type`.
    pub fn handles(&self, task_type: TaskType) -> bool {
        self.shared.handles(task_type)
    }

    pub fn submitter(&self) -> TaskSubmitter {
        TaskSubmitter::new(Arc::clone(&self.shared))
    }

    /// Cancel a task. Pending tasks are skipped at dequeue; running handlers
    /// are aborted at their next suspension point. Returns false when the
    /// task had already finished.
    #[instrument(skip(self))]
    pub fn cancel_task(&self, id: TaskId) -> Result<bool, TaskError> {
        self.shared.cancel(id)
    }

    pub fn get_task(&self, id: TaskId) -> Result<Task, TaskError> {
        self.shared
            .tasks
            .get(&id)
            .map(|entry| entry.task.clone())
            .ok_or_else(|| TaskError::NotFound { id: id.to_string() })
    }

    /// Tasks in enqueue order, optionally filtered by status.
    pub fn list_tasks(&self, status: Option<TaskStatus>) -> Vec<Task> {
        let mut tasks: Vec<(u64, Task)> = self
            .shared
            .tasks
            .iter()
            .filter(|entry| status.map_or(true, |s| entry.task.status == s))
            .map(|entry| (entry.seq, entry.task.clone()))
            .collect();
        tasks.sort_by_key(|(seq, _)| *seq);
        tasks.into_iter().map(|(_, task)| task).collect()
    }

    pub fn stats(&self) -> TaskStats {
        let mut stats = TaskStats {
            queued: self.shared.queued(),
            ..TaskStats::default()
        };
        for entry in self.shared.tasks.iter() {
            match entry.task.status {
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::Running => stats.running += 1,
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Failed => stats.failed += 1,
                TaskStatus::Cancelled => stats.cancelled += 1,
            }
        }
        stats
    }

    /// Drop finished tasks that completed at least `older_than` ago. A sweep
    /// also runs every `purge_interval_ms` with `finished_retention_secs`.
    pub fn purge_finished(&self, older_than: chrono::Duration) -> usize {
        self.shared.purge_finished(Utc::now() - older_than)
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.is_stopped()
    }

    /// Cancel running and pending tasks, then join every worker. Safe to
    /// call more than once.
    pub async fn stop(&self) {
        let first = self.shared.mark_stopped();
        if let Some(purger) = &self.purger {
            purger.abort();
        }
        let cancelled = self.shared.cancel_all();
        self.shared.wake.notify_waiters();

        let workers = std::mem::take(&mut *self.workers.lock().await);
        for handle in workers {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    error!("scheduler worker panicked: {e}");
                }
            }
        }

        if first {
            info!(cancelled, "task scheduler stopped");
        }
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        if let Some(purger) = &self.purger {
            purger.abort();
        }
        if self.shared.mark_stopped() {
            self.shared.abort_running();
            self.shared.wake.notify_waiters();
        }
    }
}
