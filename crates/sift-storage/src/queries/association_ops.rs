//! memory_entities join rows.

use rusqlite::{params, params_from_iter, Connection, Row};

use sift_core::errors::SiftResult;
use sift_core::models::MemoryEntityAssociation;

use super::memory_crud::collect_rows;
use super::placeholders;
use crate::to_storage_err;

/// Replace every association of one memory atomically.
pub fn replace_associations(
    conn: &Connection,
    memory_id: &str,
    associations: &[MemoryEntityAssociation],
) -> SiftResult<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(format!("replace_associations begin: {e}")))?;

    match replace_inner(&tx, memory_id, associations) {
        Ok(()) => {
            tx.commit()
                .map_err(|e| to_storage_err(format!("replace_associations commit: {e}")))?;
            Ok(())
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(e)
        }
    }
}

fn replace_inner(
    conn: &Connection,
    memory_id: &str,
    associations: &[MemoryEntityAssociation],
) -> SiftResult<()> {
    conn.execute(
        "DELETE FROM memory_entities WHERE memory_id = ?1",
        params![memory_id],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    for assoc in associations {
        // Two mentions resolving to one entity keep the stronger relevance.
        conn.execute(
            "INSERT INTO memory_entities (memory_id, entity_id, relevance) VALUES (?1, ?2, ?3)
             ON CONFLICT(memory_id, entity_id) DO UPDATE SET
                relevance = MAX(relevance, excluded.relevance)",
            params![memory_id, assoc.entity_id, assoc.relevance],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}

pub fn for_memory(conn: &Connection, memory_id: &str) -> SiftResult<Vec<MemoryEntityAssociation>> {
    let mut stmt = conn
        .prepare(
            "SELECT memory_id, entity_id, relevance FROM memory_entities
             WHERE memory_id = ?1 ORDER BY relevance DESC, entity_id ASC",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![memory_id], parse_association_row)
        .map_err(|e| to_storage_err(e.to_string()))?;
    collect_rows(rows)
}

pub fn for_entities(
    conn: &Connection,
    entity_ids: &[String],
) -> SiftResult<Vec<MemoryEntityAssociation>> {
    if entity_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT memory_id, entity_id, relevance FROM memory_entities
         WHERE entity_id IN ({}) ORDER BY memory_id ASC, entity_id ASC",
        placeholders(entity_ids.len())
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params_from_iter(entity_ids.iter()), parse_association_row)
        .map_err(|e| to_storage_err(e.to_string()))?;
    collect_rows(rows)
}

fn parse_association_row(row: &Row<'_>) -> rusqlite::Result<MemoryEntityAssociation> {
    Ok(MemoryEntityAssociation {
        memory_id: row.get(0)?,
        entity_id: row.get(1)?,
        relevance: row.get(2)?,
    })
}
