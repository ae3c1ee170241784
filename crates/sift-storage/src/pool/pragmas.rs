//! Per-connection PRAGMAs. Writers switch the file to WAL; readers are
//! pinned to `query_only`.

use rusqlite::Connection;

use sift_core::errors::SiftResult;

use super::PoolOptions;
use crate::to_storage_err;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Writer,
    Reader,
}

/// PRAGMA batch for a connection in `role`. `cache_size` is negative so
/// SQLite reads it as KiB.
pub fn pragma_batch(role: Role, options: PoolOptions) -> String {
    let busy = options.busy_timeout_ms;
    match role {
        Role::Writer => format!(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA cache_size = -{};
             PRAGMA busy_timeout = {busy};",
            u64::from(options.cache_mib) * 1024,
        ),
        Role::Reader => format!(
            "PRAGMA query_only = ON;
             PRAGMA cache_size = -{};
             PRAGMA busy_timeout = {busy};",
            u64::from(options.cache_mib) * 256,
        ),
    }
}

pub fn apply(conn: &Connection, role: Role, options: PoolOptions) -> SiftResult<()> {
    conn.execute_batch(&pragma_batch(role, options))
        .map_err(|e| to_storage_err(format!("applying {role:?} pragmas: {e}")))
}

/// Whether the connection's journal is in WAL mode.
pub fn verify_wal_mode(conn: &Connection) -> SiftResult<bool> {
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .map_err(|e| to_storage_err(format!("reading journal_mode: {e}")))?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_batch_is_query_only_with_smaller_cache() {
        let options = PoolOptions::default();
        let reader = pragma_batch(Role::Reader, options);
        assert!(reader.contains("query_only = ON"));
        assert!(reader.contains("cache_size = -16384"));
        assert!(!reader.contains("journal_mode"));

        let writer = pragma_batch(Role::Writer, options);
        assert!(writer.contains("journal_mode = WAL"));
        assert!(writer.contains("cache_size = -65536"));
        assert!(writer.contains("busy_timeout = 5000"));
    }

    #[test]
    fn in_memory_connection_accepts_writer_pragmas() {
        let conn = Connection::open_in_memory().unwrap();
        apply(&conn, Role::Writer, PoolOptions::default()).unwrap();
        assert!(!verify_wal_mode(&conn).unwrap());
        let fk: i64 = conn.pragma_query_value(None, "foreign_keys", |r| r.get(0)).unwrap();
        assert_eq!(fk, 1);
    }
}
