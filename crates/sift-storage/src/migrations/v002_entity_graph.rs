//! v002: entities, memory_entities, entity_relations.

use rusqlite::Connection;

use sift_core::errors::SiftResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> SiftResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS entities (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            aliases     TEXT NOT NULL DEFAULT '[]',
            description TEXT NOT NULL DEFAULT '',
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_entities_name ON entities(name COLLATE NOCASE);
        CREATE INDEX IF NOT EXISTS idx_entities_type ON entities(entity_type);

        CREATE TABLE IF NOT EXISTS memory_entities (
            memory_id TEXT NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
            entity_id TEXT NOT NULL REFERENCES entities(id),
            relevance REAL NOT NULL DEFAULT 1.0,
            PRIMARY KEY (memory_id, entity_id)
        );

        CREATE INDEX IF NOT EXISTS idx_memory_entities_entity ON memory_entities(entity_id);

        CREATE TABLE IF NOT EXISTS entity_relations (
            from_entity   TEXT NOT NULL REFERENCES entities(id),
            to_entity     TEXT NOT NULL REFERENCES entities(id),
            relation_type TEXT NOT NULL,
            created_at    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            PRIMARY KEY (from_entity, to_entity, relation_type)
        );

        CREATE INDEX IF NOT EXISTS idx_entity_relations_to ON entity_relations(to_entity);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
