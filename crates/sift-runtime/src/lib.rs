//! # sift-runtime
//!
//! Wires the store, the engines, and the task scheduler into one owned
//! [`SiftRuntime`]. There is no process-global instance: callers hold the
//! runtime and pass it where it is needed.

mod handlers;
mod options;
mod runtime;
mod telemetry;

pub use handlers::{DuplicateSweepHandler, EmbeddingHandler, EntityDedupHandler, ExtractionHandler};
pub use options::RuntimeOptions;
pub use runtime::{CreatedMemory, SiftRuntime};
pub use telemetry::init_tracing;
