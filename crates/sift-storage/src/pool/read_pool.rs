//! Read-only handles, handed out round-robin.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rusqlite::{Connection, OpenFlags};

use sift_core::errors::{SiftResult, StorageError};

use super::pragmas::{self, Role};
use super::{describe, PoolOptions};
use crate::to_storage_err;

const MAX_READERS: usize = 8;

pub struct ReadPool {
    connections: Vec<Mutex<Connection>>,
    next: AtomicUsize,
}

impl ReadPool {
    /// The schema must already exist: read-only handles cannot migrate.
    pub fn open(path: &Path, options: PoolOptions) -> SiftResult<Self> {
        let count = options.readers.clamp(1, MAX_READERS);
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let connections = (0..count)
            .map(|_| {
                let conn = Connection::open_with_flags(path, flags).map_err(|e| {
                    to_storage_err(format!("opening reader on {}: {e}", describe(Some(path))))
                })?;
                pragmas::apply(&conn, Role::Reader, options)?;
                Ok(Mutex::new(conn))
            })
            .collect::<SiftResult<Vec<_>>>()?;
        Ok(Self {
            connections,
            next: AtomicUsize::new(0),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> SiftResult<T>
    where
        F: FnOnce(&Connection) -> SiftResult<T>,
    {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.connections.len();
        let guard = self.connections[idx]
            .lock()
            .map_err(|e| StorageError::LockPoisoned {
                details: format!("reader {idx}: {e}"),
            })?;
        f(&guard)
    }

    pub fn size(&self) -> usize {
        self.connections.len()
    }
}
