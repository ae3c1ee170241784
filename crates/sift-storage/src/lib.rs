//! # sift-storage
//!
//! SQLite implementation of `IMemoryStore` and `IGraphStore`.
//! One mutex-guarded writer, an optional read pool for file-backed databases,
//! versioned migrations, FTS5 keyword search, and a brute-force cosine scan
//! over little-endian f32 embedding blobs.

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use engine::StorageEngine;

use sift_core::errors::{SiftError, StorageError};

/// Wrap a message as a storage error.
pub(crate) fn to_storage_err(message: String) -> SiftError {
    StorageError::SqliteError { message }.into()
}
