//! Time-window and context queries over memories.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use sift_core::errors::SiftResult;
use sift_core::models::MemoryRecord;

use super::fmt_ts;
use super::memory_crud::{collect_rows, parse_memory_row, MEMORY_COLUMNS};
use crate::to_storage_err;

/// Embedded memories of one context created at or after `since`, newest first.
pub fn recent_with_embeddings(
    conn: &Connection,
    context: &str,
    since: DateTime<Utc>,
) -> SiftResult<Vec<MemoryRecord>> {
    let sql = format!(
        "SELECT {MEMORY_COLUMNS} FROM memories m
         WHERE m.context = ?1 AND m.created_at >= ?2 AND m.embedding IS NOT NULL
         ORDER BY m.created_at DESC"
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![context, fmt_ts(&since)], parse_memory_row)
        .map_err(|e| to_storage_err(e.to_string()))?;
    collect_rows(rows)
}

/// Every embedded memory of one context.
pub fn embedded_in_context(conn: &Connection, context: &str) -> SiftResult<Vec<MemoryRecord>> {
    let sql = format!(
        "SELECT {MEMORY_COLUMNS} FROM memories m
         WHERE m.context = ?1 AND m.embedding IS NOT NULL
         ORDER BY m.created_at ASC"
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![context], parse_memory_row)
        .map_err(|e| to_storage_err(e.to_string()))?;
    collect_rows(rows)
}

/// Memories created in `[from, to]`, oldest first, optionally scoped to a context.
pub fn memories_between(
    conn: &Connection,
    context: Option<&str>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> SiftResult<Vec<MemoryRecord>> {
    let sql = format!(
        "SELECT {MEMORY_COLUMNS} FROM memories m
         WHERE m.created_at >= ?1 AND m.created_at <= ?2
           AND (?3 IS NULL OR m.context = ?3)
         ORDER BY m.created_at ASC, m.rowid ASC"
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![fmt_ts(&from), fmt_ts(&to), context], parse_memory_row)
        .map_err(|e| to_storage_err(e.to_string()))?;
    collect_rows(rows)
}
