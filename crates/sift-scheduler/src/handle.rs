use sift_core::errors::TaskError;
use sift_core::models::{Task, TaskId};
use tokio::sync::watch;

/// Returned by `add_task`. Carries the task id and resolves to the final
/// task snapshot once it reaches a terminal state.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    done: watch::Receiver<Option<Task>>,
}

impl TaskHandle {
    pub(crate) fn new(id: TaskId, done: watch::Receiver<Option<Task>>) -> Self {
        Self { id, done }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Whether the task already finished, without waiting.
    pub fn is_finished(&self) -> bool {
        self.done.borrow().is_some()
    }

    /// Wait for the task to complete, fail, or be cancelled.
    pub async fn wait(mut self) -> Result<Task, TaskError> {
        let finished = self
            .done
            .wait_for(Option::is_some)
            .await
            .map_err(|_| TaskError::SchedulerStopped)?;
        (*finished).clone().ok_or(TaskError::SchedulerStopped)
    }
}
