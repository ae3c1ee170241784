use std::collections::HashMap;
use std::sync::Arc;

use sift_core::errors::TaskError;
use sift_core::TaskType;
use tracing::{debug, warn};

use crate::handler::TaskHandler;

/// Closed mapping from task type to its single handler. Built before the
/// scheduler starts and frozen once handed over.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<TaskType, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `task_type`. The handler's declared type must
    /// match. Re-registering a type replaces the previous handler.
    pub fn register(
        &mut self,
        task_type: TaskType,
        handler: Arc<dyn TaskHandler>,
    ) -> Result<(), TaskError> {
        let declared = handler.task_type();
        if declared != task_type {
            return Err(TaskError::HandlerTypeMismatch {
                declared: declared.to_string(),
                registered: task_type.to_string(),
            });
        }
        if self.handlers.insert(task_type, handler).is_some() {
            warn!(task_type = %task_type, "replacing previously registered handler");
        } else {
            debug!(task_type = %task_type, "handler registered");
        }
        Ok(())
    }

    /// Register under the handler's own declared type.
    pub fn register_handler(&mut self, handler: Arc<dyn TaskHandler>) -> Result<(), TaskError> {
        let task_type = handler.task_type();
        self.register(task_type, handler)
    }

    pub fn contains(&self, task_type: TaskType) -> bool {
        self.handlers.contains_key(&task_type)
    }

    pub fn get(&self, task_type: TaskType) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(&task_type).cloned()
    }

    pub fn registered_types(&self) -> Vec<TaskType> {
        TaskType::ALL
            .into_iter()
            .filter(|t| self.handlers.contains_key(t))
            .collect()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("types", &self.registered_types())
            .finish()
    }
}
