use std::sync::Arc;

use sift_core::errors::TaskError;
use sift_core::models::{TaskId, TaskPriority, TaskType};

use crate::handle::TaskHandle;
use crate::state::Shared;

/// Everything a handler sees about the task it is running.
pub struct TaskContext {
    id: TaskId,
    task_type: TaskType,
    payload: serde_json::Value,
    shared: Arc<Shared>,
}

impl TaskContext {
    pub(crate) fn new(
        id: TaskId,
        task_type: TaskType,
        payload: serde_json::Value,
        shared: Arc<Shared>,
    ) -> Self {
        Self {
            id,
            task_type,
            payload,
            shared,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    /// String field of an object payload.
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(serde_json::Value::as_str)
    }

    /// Record progress in `[0, 1]`. Values outside are clamped.
    pub fn report_progress(&self, fraction: f64) {
        self.shared.set_progress(self.id, fraction);
    }

    /// True once the scheduler began shutting down. Long retry loops should
    /// give up early.
    pub fn is_stopping(&self) -> bool {
        self.shared.is_stopped()
    }

    /// Submitter for follow-up tasks.
    pub fn submitter(&self) -> TaskSubmitter {
        TaskSubmitter {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Cloneable enqueue-only view of a scheduler.
#[derive(Clone)]
pub struct TaskSubmitter {
    shared: Arc<Shared>,
}

impl TaskSubmitter {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    pub fn submit(
        &self,
        task_type: TaskType,
        name: impl Into<String>,
        priority: TaskPriority,
        payload: serde_json::Value,
    ) -> Result<TaskHandle, TaskError> {
        self.shared
            .enqueue(task_type, name.into(), priority, payload)
    }
}
