use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::TaskError;

pub type TaskId = uuid::Uuid;

/// Closed set of background job kinds. Each variant maps to exactly one
/// registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    GenerateEmbedding,
    ExtractEntities,
    ExactDuplicateSweep,
    EntityDeduplication,
}

impl TaskType {
    pub const ALL: [TaskType; 4] = [
        Self::GenerateEmbedding,
        Self::ExtractEntities,
        Self::ExactDuplicateSweep,
        Self::EntityDeduplication,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GenerateEmbedding => "generate_embedding",
            Self::ExtractEntities => "extract_entities",
            Self::ExactDuplicateSweep => "exact_duplicate_sweep",
            Self::EntityDeduplication => "entity_deduplication",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TaskError::UnknownTaskType { name: s.to_string() })
    }
}

/// Priority class. Higher classes are always dequeued first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low = 0,
    Normal = 1,
    High = 2,
    Critical = 3,
}

impl TaskPriority {
    /// All classes from highest to lowest (dequeue order).
    pub const ALL_DESC: [TaskPriority; 4] = [Self::Critical, Self::High, Self::Normal, Self::Low];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Lifecycle state. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Pending→Running, Pending→Cancelled, Running→{Completed, Failed, Cancelled}.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        match (self, next) {
            (Self::Pending, Self::Running | Self::Cancelled) => true,
            (Self::Running, Self::Completed | Self::Failed | Self::Cancelled) => true,
            _ => false,
        }
    }
}

/// A unit of background work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub task_type: TaskType,
    pub name: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    /// 0.0–1.0.
    pub progress: f64,
    pub payload: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    /// Error chain / panic detail captured on failure.
    pub trace: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(
        task_type: TaskType,
        name: impl Into<String>,
        priority: TaskPriority,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            task_type,
            name: name.into(),
            priority,
            status: TaskStatus::Pending,
            progress: 0.0,
            payload,
            result: None,
            error: None,
            trace: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Apply a status transition, stamping timestamps. Returns false (and
    /// leaves the task untouched) when the transition would move backwards.
    pub fn transition(&mut self, next: TaskStatus) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        let now = Utc::now();
        match next {
            TaskStatus::Running => self.started_at = Some(now),
            TaskStatus::Completed => {
                self.completed_at = Some(now);
                self.progress = 1.0;
            }
            TaskStatus::Failed | TaskStatus::Cancelled => self.completed_at = Some(now),
            TaskStatus::Pending => {}
        }
        self.status = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_are_monotonic() {
        let mut task = Task::new(TaskType::GenerateEmbedding, "t", TaskPriority::Normal, serde_json::Value::Null);
        assert!(task.transition(TaskStatus::Running));
        assert!(task.started_at.is_some());
        assert!(task.transition(TaskStatus::Completed));
        assert!(!task.transition(TaskStatus::Running));
        assert!(!task.transition(TaskStatus::Pending));
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress, 1.0);
    }

    #[test]
    fn pending_can_be_cancelled_directly() {
        let mut task = Task::new(TaskType::ExtractEntities, "t", TaskPriority::Low, serde_json::Value::Null);
        assert!(task.transition(TaskStatus::Cancelled));
        assert!(task.status.is_terminal());
        assert!(!task.transition(TaskStatus::Running));
    }

    #[test]
    fn unknown_type_name_is_rejected() {
        assert_eq!("extract_entities".parse::<TaskType>().unwrap(), TaskType::ExtractEntities);
        assert!(matches!(
            "resize_images".parse::<TaskType>(),
            Err(TaskError::UnknownTaskType { .. })
        ));
    }

    #[test]
    fn priority_order() {
        assert!(TaskPriority::Critical > TaskPriority::High);
        assert!(TaskPriority::High > TaskPriority::Normal);
        assert!(TaskPriority::Normal > TaskPriority::Low);
    }
}
