//! v001: memories table, FTS5 index kept in sync by triggers.

use rusqlite::Connection;

use sift_core::errors::SiftResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> SiftResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS memories (
            id              TEXT PRIMARY KEY,
            content         TEXT NOT NULL,
            title           TEXT,
            tags            TEXT NOT NULL DEFAULT '[]',
            embedding       BLOB,
            embedding_dims  INTEGER,
            embedding_model TEXT,
            context         TEXT NOT NULL,
            platform        TEXT,
            content_hash    TEXT NOT NULL,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL,
            extracted       INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_memories_context_created ON memories(context, created_at);
        CREATE INDEX IF NOT EXISTS idx_memories_hash ON memories(content_hash);

        CREATE VIRTUAL TABLE IF NOT EXISTS memory_fts USING fts5(
            title,
            content,
            content = 'memories',
            content_rowid = 'rowid'
        );

        CREATE TRIGGER IF NOT EXISTS memories_fts_insert AFTER INSERT ON memories BEGIN
            INSERT INTO memory_fts(rowid, title, content)
            VALUES (new.rowid, COALESCE(new.title, ''), new.content);
        END;

        CREATE TRIGGER IF NOT EXISTS memories_fts_delete AFTER DELETE ON memories BEGIN
            INSERT INTO memory_fts(memory_fts, rowid, title, content)
            VALUES ('delete', old.rowid, COALESCE(old.title, ''), old.content);
        END;

        CREATE TRIGGER IF NOT EXISTS memories_fts_update AFTER UPDATE OF title, content ON memories BEGIN
            INSERT INTO memory_fts(memory_fts, rowid, title, content)
            VALUES ('delete', old.rowid, COALESCE(old.title, ''), old.content);
            INSERT INTO memory_fts(rowid, title, content)
            VALUES (new.rowid, COALESCE(new.title, ''), new.content);
        END;
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
