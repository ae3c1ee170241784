//! SQLite connections for one database: a single writer behind a mutex and,
//! for file databases, a round-robin set of read-only handles that run beside
//! the writer under WAL.

pub mod pragmas;
pub mod read_pool;
pub mod write_connection;

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use sift_core::errors::SiftResult;

pub use read_pool::ReadPool;
pub use write_connection::WriteConnection;

/// Tuning for [`ConnectionPool::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    /// Read-only handles for file databases, clamped to `1..=8`.
    pub readers: usize,
    pub busy_timeout_ms: u32,
    /// Page cache per writer connection. Readers get a quarter.
    pub cache_mib: u32,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            readers: 4,
            busy_timeout_ms: 5_000,
            cache_mib: 64,
        }
    }
}

pub struct ConnectionPool {
    pub writer: WriteConnection,
    /// `None` for in-memory databases: a second connection would open a
    /// different, empty database, so reads share the writer.
    pub readers: Option<ReadPool>,
    db_path: Option<PathBuf>,
}

impl ConnectionPool {
    pub fn open(path: &Path, options: PoolOptions) -> SiftResult<Self> {
        let writer = WriteConnection::open(path, options)?;
        let readers = ReadPool::open(path, options)?;
        Ok(Self {
            writer,
            readers: Some(readers),
            db_path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory(options: PoolOptions) -> SiftResult<Self> {
        Ok(Self {
            writer: WriteConnection::open_in_memory(options)?,
            readers: None,
            db_path: None,
        })
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Run `f` on a reader, or on the writer when there are none.
    pub fn read<F, T>(&self, f: F) -> SiftResult<T>
    where
        F: FnOnce(&Connection) -> SiftResult<T>,
    {
        match &self.readers {
            Some(readers) => readers.with_conn(f),
            None => self.writer.with_conn(f),
        }
    }

    pub fn write<F, T>(&self, f: F) -> SiftResult<T>
    where
        F: FnOnce(&Connection) -> SiftResult<T>,
    {
        self.writer.with_conn(f)
    }
}

/// Label used in open and lock errors.
pub(crate) fn describe(path: Option<&Path>) -> String {
    path.map_or_else(|| ":memory:".to_string(), |p| p.display().to_string())
}
