use std::error::Error as StdError;
use std::fmt;

use async_trait::async_trait;
use sift_core::TaskType;

use crate::context::TaskContext;

/// A background job implementation. Exactly one handler is registered per
/// [`TaskType`]; the handler reports the type it serves so the registry can
/// reject mis-wired registrations.
#[async_trait]
pub trait TaskHandler: Send + Sync + 'static {
    fn task_type(&self) -> TaskType;

    /// Execute one task. The returned value is stored as the task result.
    async fn run(&self, ctx: TaskContext) -> Result<serde_json::Value, TaskFailure>;
}

/// Error returned by a handler, with an optional trace (error chain, retry
/// history) kept alongside the message on the failed task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFailure {
    pub error: String,
    pub trace: Option<String>,
}

impl TaskFailure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            trace: None,
        }
    }

    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.error)
    }
}

/// Any error converts into a failure; its `source()` chain becomes the trace.
impl<E> From<E> for TaskFailure
where
    E: StdError,
{
    fn from(err: E) -> Self {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(format!("caused by: {cause}"));
            source = cause.source();
        }
        let failure = Self::new(err.to_string());
        if chain.is_empty() {
            failure
        } else {
            failure.with_trace(chain.join("\n"))
        }
    }
}
