//! # sift-scheduler
//!
//! Background task execution for the content layer.
//!
//! - Four priority classes, strict priority dequeue, FIFO within a class.
//!   Low-priority work can starve while higher classes stay busy.
//! - Closed handler registry: one handler per [`TaskType`](sift_core::TaskType),
//!   checked at registration and again at enqueue.
//! - Fixed worker pool. Each dequeued task runs exactly once; retries belong
//!   to the handler.
//! - Panics and handler errors are recorded on the task and never take a
//!   worker down.

mod context;
mod handle;
mod handler;
mod queue;
mod registry;
mod scheduler;
mod state;
mod worker;

pub use context::{TaskContext, TaskSubmitter};
pub use handle::TaskHandle;
pub use handler::{TaskFailure, TaskHandler};
pub use registry::HandlerRegistry;
pub use scheduler::{TaskScheduler, TaskStats};
