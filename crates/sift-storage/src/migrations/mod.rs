//! Versioned schema migrations, applied in order inside one transaction each.
//!
//! Applied versions are recorded in `schema_version`; re-running is a no-op.

mod v001_memories;
mod v002_entity_graph;
mod v003_merge_audit;

use rusqlite::{params, Connection};
use tracing::info;

use sift_core::errors::{SiftResult, StorageError};

use crate::to_storage_err;

type MigrationFn = fn(&Connection) -> SiftResult<()>;

const MIGRATIONS: &[(u32, &str, MigrationFn)] = &[
    (1, "memories", v001_memories::migrate),
    (2, "entity_graph", v002_entity_graph::migrate),
    (3, "merge_audit", v003_merge_audit::migrate),
];

/// Latest schema version this build knows about.
pub const LATEST_VERSION: u32 = 3;

/// Apply every migration newer than the recorded schema version.
pub fn run_migrations(conn: &Connection) -> SiftResult<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            name       TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    let current = current_version(conn)?;
    let mut applied = 0;

    for (version, name, migrate) in MIGRATIONS {
        if *version <= current {
            continue;
        }
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| to_storage_err(format!("migration {version} begin: {e}")))?;
        let outcome = migrate(&tx).and_then(|_| {
            tx.execute(
                "INSERT INTO schema_version (version, name) VALUES (?1, ?2)",
                params![version, name],
            )
            .map_err(|e| to_storage_err(e.to_string()))
        });
        match outcome {
            Ok(_) => {
                tx.commit().map_err(|e| StorageError::MigrationFailed {
                    version: *version,
                    reason: e.to_string(),
                })?;
                info!(version, name, "applied migration");
                applied += 1;
            }
            Err(e) => {
                let _ = tx.rollback();
                return Err(StorageError::MigrationFailed {
                    version: *version,
                    reason: e.to_string(),
                }
                .into());
            }
        }
    }

    Ok(applied)
}

/// Highest applied schema version, 0 on a fresh database.
pub fn current_version(conn: &Connection) -> SiftResult<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}
