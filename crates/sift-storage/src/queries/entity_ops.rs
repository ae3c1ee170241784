//! Entity rows: insert, update, lookup by id or by name/alias.

use rusqlite::{params, Connection, OptionalExtension, Row};

use sift_core::errors::{EntityError, SiftResult};
use sift_core::models::Entity;

use super::memory_crud::collect_rows;
use super::{fmt_ts, parse_string_list, parse_ts};
use crate::to_storage_err;

const ENTITY_COLUMNS: &str =
    "e.id, e.name, e.entity_type, e.aliases, e.description, e.created_at, e.updated_at";

pub fn insert_entity(conn: &Connection, entity: &Entity) -> SiftResult<()> {
    let aliases = serde_json::to_string(&entity.aliases)?;
    conn.execute(
        "INSERT INTO entities (id, name, entity_type, aliases, description, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entity.id,
            entity.name,
            entity.entity_type,
            aliases,
            entity.description,
            fmt_ts(&entity.created_at),
            fmt_ts(&entity.updated_at),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Rewrite the mutable fields of an existing entity.
pub fn update_entity(conn: &Connection, entity: &Entity) -> SiftResult<()> {
    let aliases = serde_json::to_string(&entity.aliases)?;
    let changed = conn
        .execute(
            "UPDATE entities
             SET name = ?2, entity_type = ?3, aliases = ?4, description = ?5, updated_at = ?6
             WHERE id = ?1",
            params![
                entity.id,
                entity.name,
                entity.entity_type,
                aliases,
                entity.description,
                fmt_ts(&entity.updated_at),
            ],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    if changed == 0 {
        return Err(EntityError::NotFound {
            id: entity.id.clone(),
        }
        .into());
    }
    Ok(())
}

pub fn get_entity(conn: &Connection, id: &str) -> SiftResult<Option<Entity>> {
    let sql = format!("SELECT {ENTITY_COLUMNS} FROM entities e WHERE e.id = ?1");
    conn.query_row(&sql, params![id], parse_entity_row)
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))
}

/// All entities, oldest first.
pub fn list_entities(conn: &Connection) -> SiftResult<Vec<Entity>> {
    let sql = format!("SELECT {ENTITY_COLUMNS} FROM entities e ORDER BY e.created_at ASC, e.rowid ASC");
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], parse_entity_row)
        .map_err(|e| to_storage_err(e.to_string()))?;
    collect_rows(rows)
}

/// Case-insensitive match on the canonical name or any alias, oldest first.
pub fn find_by_name(conn: &Connection, name: &str) -> SiftResult<Vec<Entity>> {
    let sql = format!(
        "SELECT {ENTITY_COLUMNS} FROM entities e
         WHERE lower(e.name) = lower(?1)
            OR EXISTS (SELECT 1 FROM json_each(e.aliases) a WHERE lower(a.value) = lower(?1))
         ORDER BY e.created_at ASC, e.rowid ASC"
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![name.trim()], parse_entity_row)
        .map_err(|e| to_storage_err(e.to_string()))?;
    collect_rows(rows)
}

pub fn entity_exists(conn: &Connection, id: &str) -> SiftResult<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM entities WHERE id = ?1)",
        params![id],
        |row| row.get(0),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

fn parse_entity_row(row: &Row<'_>) -> rusqlite::Result<Entity> {
    let aliases_raw: String = row.get(3)?;
    let created_raw: String = row.get(5)?;
    let updated_raw: String = row.get(6)?;
    Ok(Entity {
        id: row.get(0)?,
        name: row.get(1)?,
        entity_type: row.get(2)?,
        aliases: parse_string_list(3, &aliases_raw)?,
        description: row.get(4)?,
        created_at: parse_ts(5, &created_raw)?,
        updated_at: parse_ts(6, &updated_raw)?,
    })
}
