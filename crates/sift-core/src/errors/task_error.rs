/// Task scheduler errors. Execution failures of individual tasks are not
/// errors at this level; they are recorded on the task itself.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("no handler registered for task type {task_type}")]
    HandlerMissing { task_type: String },

    #[error("unknown task type: {name}")]
    UnknownTaskType { name: String },

    #[error("handler declares type {declared} but was registered for {registered}")]
    HandlerTypeMismatch { declared: String, registered: String },

    #[error("task not found: {id}")]
    NotFound { id: String },

    #[error("scheduler is stopped")]
    SchedulerStopped,
}
