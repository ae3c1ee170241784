use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sift_core::config::SchedulerConfig;
use sift_core::errors::TaskError;
use sift_core::models::{Task, TaskId, TaskPriority, TaskStatus, TaskType};
use tokio::sync::{watch, Notify};
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::handle::TaskHandle;
use crate::handler::TaskHandler;
use crate::queue::PriorityQueues;
use crate::registry::HandlerRegistry;

pub(crate) struct TaskEntry {
    pub(crate) task: Task,
    /// Enqueue order, for stable listings.
    pub(crate) seq: u64,
    done: watch::Sender<Option<Task>>,
}

impl TaskEntry {
    fn publish(&self) {
        self.done.send_replace(Some(self.task.clone()));
    }
}

/// Work handed from the queue to a worker.
pub(crate) struct Dispatch {
    pub(crate) id: TaskId,
    pub(crate) task_type: TaskType,
    pub(crate) payload: serde_json::Value,
    pub(crate) handler: Arc<dyn TaskHandler>,
}

pub(crate) enum Outcome {
    Completed(serde_json::Value),
    Failed { error: String, trace: Option<String> },
    Cancelled,
}

/// State shared by the scheduler facade, its workers, and task contexts.
pub(crate) struct Shared {
    pub(crate) config: SchedulerConfig,
    registry: HandlerRegistry,
    pub(crate) tasks: DashMap<TaskId, TaskEntry>,
    queue: PriorityQueues,
    running: DashMap<TaskId, AbortHandle>,
    pub(crate) wake: Notify,
    stopped: AtomicBool,
    next_seq: AtomicU64,
}

impl Shared {
    pub(crate) fn new(config: SchedulerConfig, registry: HandlerRegistry) -> Self {
        Self {
            config,
            registry,
            tasks: DashMap::new(),
            queue: PriorityQueues::default(),
            running: DashMap::new(),
            wake: Notify::new(),
            stopped: AtomicBool::new(false),
            next_seq: AtomicU64::new(0),
        }
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Flip the stopped flag. Returns true only for the first caller.
    pub(crate) fn mark_stopped(&self) -> bool {
        !self.stopped.swap(true, Ordering::SeqCst)
    }

    pub(crate) fn handles(&self, task_type: TaskType) -> bool {
        self.registry.contains(task_type)
    }

    pub(crate) fn registered_types(&self) -> Vec<TaskType> {
        self.registry.registered_types()
    }

    pub(crate) fn queued(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn enqueue(
        &self,
        task_type: TaskType,
        name: String,
        priority: TaskPriority,
        payload: serde_json::Value,
    ) -> Result<TaskHandle, TaskError> {
        if self.is_stopped() {
            return Err(TaskError::SchedulerStopped);
        }
        if !self.registry.contains(task_type) {
            return Err(TaskError::HandlerMissing {
                task_type: task_type.to_string(),
            });
        }

        let task = Task::new(task_type, name, priority, payload);
        let id = task.id;
        let (done, receiver) = watch::channel(None);
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.tasks.insert(id, TaskEntry { task, seq, done });

        // A concurrent stop() may have swept pending tasks before this insert.
        if self.is_stopped() {
            let _ = self.cancel(id);
            return Err(TaskError::SchedulerStopped);
        }

        self.queue.push(priority, id);
        self.wake.notify_one();
        debug!(task_id = %id, task_type = %task_type, ?priority, "task enqueued");
        Ok(TaskHandle::new(id, receiver))
    }

    /// Pop the next runnable task and mark it running. Cancelled entries are
    /// discarded on the way.
    pub(crate) fn dequeue(&self) -> Option<Dispatch> {
        while let Some(id) = self.queue.pop() {
            let Some(mut entry) = self.tasks.get_mut(&id) else {
                continue;
            };
            if !entry.task.transition(TaskStatus::Running) {
                debug!(task_id = %id, status = ?entry.task.status, "skipping non-pending task");
                continue;
            }
            let task_type = entry.task.task_type;
            let payload = entry.task.payload.clone();
            drop(entry);

            match self.registry.get(task_type) {
                Some(handler) => {
                    return Some(Dispatch {
                        id,
                        task_type,
                        payload,
                        handler,
                    })
                }
                None => self.finish(
                    id,
                    Outcome::Failed {
                        error: TaskError::HandlerMissing {
                            task_type: task_type.to_string(),
                        }
                        .to_string(),
                        trace: None,
                    },
                ),
            }
        }
        None
    }

    pub(crate) fn track_running(&self, id: TaskId, abort: AbortHandle) {
        self.running.insert(id, abort);
        // Cancelled between dequeue and spawn.
        let terminal = self
            .tasks
            .get(&id)
            .map_or(true, |entry| entry.task.status.is_terminal());
        if terminal {
            if let Some((_, handle)) = self.running.remove(&id) {
                handle.abort();
            }
        }
    }

    pub(crate) fn untrack_running(&self, id: TaskId) {
        self.running.remove(&id);
    }

    pub(crate) fn set_progress(&self, id: TaskId, fraction: f64) {
        if let Some(mut entry) = self.tasks.get_mut(&id) {
            if entry.task.status == TaskStatus::Running {
                entry.task.progress = fraction.clamp(0.0, 1.0);
            }
        }
    }

    /// Record the terminal state of a task. No-op when the task already
    /// reached a terminal state (e.g. cancelled while running).
    pub(crate) fn finish(&self, id: TaskId, outcome: Outcome) {
        let Some(mut entry) = self.tasks.get_mut(&id) else {
            return;
        };
        let next = match &outcome {
            Outcome::Completed(_) => TaskStatus::Completed,
            Outcome::Failed { .. } => TaskStatus::Failed,
            Outcome::Cancelled => TaskStatus::Cancelled,
        };
        if !entry.task.status.can_transition_to(next) {
            return;
        }
        match outcome {
            Outcome::Completed(value) => entry.task.result = Some(value),
            Outcome::Failed { error, trace } => {
                warn!(task_id = %id, task_type = %entry.task.task_type, %error, "task failed");
                entry.task.error = Some(error);
                entry.task.trace = trace;
            }
            Outcome::Cancelled => {}
        }
        entry.task.transition(next);
        entry.publish();
        debug!(task_id = %id, status = ?next, "task finished");
    }

    /// Cancel a pending or running task. Returns false when it had already
    /// finished.
    pub(crate) fn cancel(&self, id: TaskId) -> Result<bool, TaskError> {
        let mut entry = self
            .tasks
            .get_mut(&id)
            .ok_or_else(|| TaskError::NotFound { id: id.to_string() })?;
        let was = entry.task.status;
        if !entry.task.transition(TaskStatus::Cancelled) {
            return Ok(false);
        }
        entry.publish();
        drop(entry);

        if was == TaskStatus::Running {
            if let Some((_, handle)) = self.running.remove(&id) {
                handle.abort();
            }
        }
        debug!(task_id = %id, previous = ?was, "task cancelled");
        Ok(true)
    }

    /// Cancel everything not yet finished. Returns how many tasks changed.
    pub(crate) fn cancel_all(&self) -> usize {
        self.queue.clear();
        let open: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|entry| !entry.task.status.is_terminal())
            .map(|entry| *entry.key())
            .collect();
        open.into_iter()
            .filter(|id| matches!(self.cancel(*id), Ok(true)))
            .count()
    }

    /// Abort running handlers without recording anything. Used on drop.
    pub(crate) fn abort_running(&self) {
        for entry in self.running.iter() {
            entry.value().abort();
        }
    }

    pub(crate) fn purge_finished(&self, cutoff: DateTime<Utc>) -> usize {
        let mut purged = 0;
        self.tasks.retain(|_, entry| {
            let expired = entry.task.status.is_terminal()
                && entry.task.completed_at.map_or(false, |at| at <= cutoff);
            if expired {
                purged += 1;
            }
            !expired
        });
        purged
    }
}
