//! Entity merge execution, merge history, and forwarding lookups.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use sift_core::errors::{EntityError, SiftResult};
use sift_core::models::{MergeHistoryEntry, MergePlan, MergeStats};

use super::memory_crud::collect_rows;
use super::{entity_ops, fmt_ts, parse_ts};
use crate::to_storage_err;

/// Execute a merge plan in a single transaction.
/// Either every row moves to the survivor or nothing changes.
pub fn apply_merge(conn: &Connection, plan: &MergePlan) -> SiftResult<MergeStats> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(format!("apply_merge begin: {e}")))?;

    match apply_merge_inner(&tx, plan) {
        Ok(stats) => {
            tx.commit()
                .map_err(|e| to_storage_err(format!("apply_merge commit: {e}")))?;
            Ok(stats)
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(e)
        }
    }
}

fn apply_merge_inner(conn: &Connection, plan: &MergePlan) -> SiftResult<MergeStats> {
    let primary_id = plan.survivor.id.as_str();
    let secondary_id = plan.secondary_id.as_str();

    for id in [primary_id, secondary_id] {
        if !entity_ops::entity_exists(conn, id)? {
            return Err(EntityError::NotFound { id: id.to_string() }.into());
        }
    }

    entity_ops::update_entity(conn, &plan.survivor)?;

    let mut stats = MergeStats::default();
    redirect_associations(conn, primary_id, secondary_id, &mut stats)?;
    redirect_relations(conn, primary_id, secondary_id, &mut stats)?;

    let h = &plan.history;
    conn.execute(
        "INSERT INTO entity_merge_history (
            id, primary_id, secondary_id, strategy, merged_at, secondary_name, secondary_description
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            h.id,
            h.primary_id,
            h.secondary_id,
            h.strategy.as_str(),
            fmt_ts(&h.merged_at),
            h.secondary_name,
            h.secondary_description,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    conn.execute("DELETE FROM entities WHERE id = ?1", params![secondary_id])
        .map_err(|e| to_storage_err(e.to_string()))?;

    // Ids already forwarded to the secondary now forward straight to the primary.
    conn.execute(
        "UPDATE entity_forwarding SET surviving_id = ?1 WHERE surviving_id = ?2",
        params![primary_id, secondary_id],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    conn.execute(
        "INSERT OR REPLACE INTO entity_forwarding (retired_id, surviving_id, merged_at)
         VALUES (?1, ?2, ?3)",
        params![secondary_id, primary_id, fmt_ts(&h.merged_at)],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    debug!(
        primary = primary_id,
        secondary = secondary_id,
        memories = stats.memories_affected,
        relations = stats.relations_affected,
        skipped = stats.duplicates_skipped,
        "merge applied"
    );
    Ok(stats)
}

fn redirect_associations(
    conn: &Connection,
    primary_id: &str,
    secondary_id: &str,
    stats: &mut MergeStats,
) -> SiftResult<()> {
    let moving: Vec<(String, f64)> = {
        let mut stmt = conn
            .prepare("SELECT memory_id, relevance FROM memory_entities WHERE entity_id = ?1")
            .map_err(|e| to_storage_err(e.to_string()))?;
        let rows = stmt
            .query_map(params![secondary_id], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(|e| to_storage_err(e.to_string()))?;
        collect_rows(rows)?
    };

    for (memory_id, relevance) in moving {
        stats.memories_affected += 1;
        let collapsed = conn
            .execute(
                "UPDATE memory_entities SET relevance = MAX(relevance, ?3)
                 WHERE memory_id = ?1 AND entity_id = ?2",
                params![memory_id, primary_id, relevance],
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
        if collapsed > 0 {
            stats.duplicates_skipped += 1;
            conn.execute(
                "DELETE FROM memory_entities WHERE memory_id = ?1 AND entity_id = ?2",
                params![memory_id, secondary_id],
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
        } else {
            conn.execute(
                "UPDATE memory_entities SET entity_id = ?2 WHERE memory_id = ?1 AND entity_id = ?3",
                params![memory_id, primary_id, secondary_id],
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
        }
    }
    Ok(())
}

fn redirect_relations(
    conn: &Connection,
    primary_id: &str,
    secondary_id: &str,
    stats: &mut MergeStats,
) -> SiftResult<()> {
    let edges: Vec<(String, String, String, String)> = {
        let mut stmt = conn
            .prepare(
                "SELECT from_entity, to_entity, relation_type, created_at FROM entity_relations
                 WHERE from_entity = ?1 OR to_entity = ?1",
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
        let rows = stmt
            .query_map(params![secondary_id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })
            .map_err(|e| to_storage_err(e.to_string()))?;
        collect_rows(rows)?
    };

    let swap = |id: &str| {
        if id == secondary_id {
            primary_id.to_string()
        } else {
            id.to_string()
        }
    };

    for (from, to, relation_type, created_at) in edges {
        stats.relations_affected += 1;
        conn.execute(
            "DELETE FROM entity_relations
             WHERE from_entity = ?1 AND to_entity = ?2 AND relation_type = ?3",
            params![from, to, relation_type],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

        let (new_from, new_to) = (swap(&from), swap(&to));
        if new_from == new_to {
            // An edge between the two merged entities would become a self-loop.
            stats.duplicates_skipped += 1;
            continue;
        }
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO entity_relations (from_entity, to_entity, relation_type, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![new_from, new_to, relation_type, created_at],
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
        if inserted == 0 {
            stats.duplicates_skipped += 1;
        }
    }
    Ok(())
}

/// History rows where the entity was either side of a merge, oldest first.
pub fn history_for(conn: &Connection, entity_id: &str) -> SiftResult<Vec<MergeHistoryEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, primary_id, secondary_id, strategy, merged_at, secondary_name, secondary_description
             FROM entity_merge_history
             WHERE primary_id = ?1 OR secondary_id = ?1
             ORDER BY merged_at ASC, rowid ASC",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![entity_id], |row| {
            let strategy_raw: String = row.get(3)?;
            let merged_raw: String = row.get(4)?;
            let strategy = strategy_raw.parse().map_err(|e: sift_core::SiftError| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())),
                )
            })?;
            Ok(MergeHistoryEntry {
                id: row.get(0)?,
                primary_id: row.get(1)?,
                secondary_id: row.get(2)?,
                strategy,
                merged_at: parse_ts(4, &merged_raw)?,
                secondary_name: row.get(5)?,
                secondary_description: row.get(6)?,
            })
        })
        .map_err(|e| to_storage_err(e.to_string()))?;
    collect_rows(rows)
}

pub fn forwarded_to(conn: &Connection, retired_id: &str) -> SiftResult<Option<String>> {
    conn.query_row(
        "SELECT surviving_id FROM entity_forwarding WHERE retired_id = ?1",
        params![retired_id],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))
}
