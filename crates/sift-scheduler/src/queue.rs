use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use sift_core::models::{TaskId, TaskPriority};

/// One FIFO per priority class. `pop` always drains the highest non-empty
/// class first.
#[derive(Debug, Default)]
pub(crate) struct PriorityQueues {
    classes: Mutex<[VecDeque<TaskId>; 4]>,
}

impl PriorityQueues {
    pub(crate) fn push(&self, priority: TaskPriority, id: TaskId) {
        let mut classes = self.classes.lock().unwrap_or_else(PoisonError::into_inner);
        classes[priority.index()].push_back(id);
    }

    pub(crate) fn pop(&self) -> Option<TaskId> {
        let mut classes = self.classes.lock().unwrap_or_else(PoisonError::into_inner);
        TaskPriority::ALL_DESC
            .iter()
            .find_map(|p| classes[p.index()].pop_front())
    }

    pub(crate) fn len(&self) -> usize {
        let classes = self.classes.lock().unwrap_or_else(PoisonError::into_inner);
        classes.iter().map(VecDeque::len).sum()
    }

    pub(crate) fn clear(&self) -> Vec<TaskId> {
        let mut classes = self.classes.lock().unwrap_or_else(PoisonError::into_inner);
        classes.iter_mut().flat_map(|q| q.drain(..)).collect()
    }
}
