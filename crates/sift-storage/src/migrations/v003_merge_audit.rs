//! v003: append-only merge history and the entity forwarding index.

use rusqlite::Connection;

use sift_core::errors::SiftResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> SiftResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS entity_merge_history (
            id                    TEXT PRIMARY KEY,
            primary_id            TEXT NOT NULL,
            secondary_id          TEXT NOT NULL,
            strategy              TEXT NOT NULL,
            merged_at             TEXT NOT NULL,
            secondary_name        TEXT NOT NULL,
            secondary_description TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_merge_history_primary ON entity_merge_history(primary_id);
        CREATE INDEX IF NOT EXISTS idx_merge_history_secondary ON entity_merge_history(secondary_id);

        CREATE TRIGGER IF NOT EXISTS merge_history_no_update
        BEFORE UPDATE ON entity_merge_history BEGIN
            SELECT RAISE(ABORT, 'entity_merge_history is append-only');
        END;

        CREATE TRIGGER IF NOT EXISTS merge_history_no_delete
        BEFORE DELETE ON entity_merge_history BEGIN
            SELECT RAISE(ABORT, 'entity_merge_history is append-only');
        END;

        CREATE TABLE IF NOT EXISTS entity_forwarding (
            retired_id   TEXT PRIMARY KEY,
            surviving_id TEXT NOT NULL,
            merged_at    TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_entity_forwarding_surviving ON entity_forwarding(surviving_id);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
