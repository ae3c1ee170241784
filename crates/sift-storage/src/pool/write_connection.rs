//! The single writer. SQLite allows one writer at a time; the mutex makes
//! callers queue here instead of on `SQLITE_BUSY`.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use sift_core::errors::{SiftResult, StorageError};

use super::pragmas::{self, Role};
use super::{describe, PoolOptions};
use crate::to_storage_err;

pub struct WriteConnection {
    conn: Mutex<Connection>,
    label: String,
}

impl WriteConnection {
    pub fn open(path: &Path, options: PoolOptions) -> SiftResult<Self> {
        let label = describe(Some(path));
        let conn = Connection::open(path)
            .map_err(|e| to_storage_err(format!("opening writer on {label}: {e}")))?;
        Self::configured(conn, label, options)
    }

    /// `journal_mode = WAL` is ignored in memory; the other pragmas apply.
    pub fn open_in_memory(options: PoolOptions) -> SiftResult<Self> {
        let label = describe(None);
        let conn = Connection::open_in_memory()
            .map_err(|e| to_storage_err(format!("opening writer on {label}: {e}")))?;
        Self::configured(conn, label, options)
    }

    fn configured(conn: Connection, label: String, options: PoolOptions) -> SiftResult<Self> {
        pragmas::apply(&conn, Role::Writer, options)?;
        Ok(Self {
            conn: Mutex::new(conn),
            label,
        })
    }

    /// Run `f` with exclusive access to the writer.
    pub fn with_conn<F, T>(&self, f: F) -> SiftResult<T>
    where
        F: FnOnce(&Connection) -> SiftResult<T>,
    {
        let guard = self.conn.lock().map_err(|e| StorageError::LockPoisoned {
            details: format!("writer on {}: {e}", self.label),
        })?;
        f(&guard)
    }
}
