//! Typed, directed edges between entities.

use rusqlite::{params, params_from_iter, Connection};

use sift_core::errors::SiftResult;
use sift_core::models::Relation;

use super::memory_crud::collect_rows;
use super::placeholders;
use crate::to_storage_err;

/// Insert an edge; returns false when the (from, to, type) triple already exists.
pub fn add_relation(conn: &Connection, relation: &Relation) -> SiftResult<bool> {
    let inserted = conn
        .execute(
            "INSERT OR IGNORE INTO entity_relations (from_entity, to_entity, relation_type)
             VALUES (?1, ?2, ?3)",
            params![relation.from_entity, relation.to_entity, relation.relation_type],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(inserted > 0)
}

/// Edges with either endpoint in `entity_ids`.
pub fn touching(conn: &Connection, entity_ids: &[String]) -> SiftResult<Vec<Relation>> {
    if entity_ids.is_empty() {
        return Ok(Vec::new());
    }
    let marks = placeholders(entity_ids.len());
    let sql = format!(
        "SELECT from_entity, to_entity, relation_type FROM entity_relations
         WHERE from_entity IN ({marks}) OR to_entity IN ({marks})
         ORDER BY from_entity, to_entity, relation_type"
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params_from_iter(entity_ids.iter()), |row| {
            Ok(Relation {
                from_entity: row.get(0)?,
                to_entity: row.get(1)?,
                relation_type: row.get(2)?,
            })
        })
        .map_err(|e| to_storage_err(e.to_string()))?;
    collect_rows(rows)
}
