//! Insert, get, bulk get, and column patches for memories.

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use sift_core::errors::{SiftError, SiftResult};
use sift_core::models::MemoryRecord;

use super::vector_search::{bytes_to_f32_vec, f32_vec_to_bytes};
use super::{fmt_ts, parse_string_list, parse_ts, placeholders};
use crate::to_storage_err;

/// Column list matching [`parse_memory_row`].
pub const MEMORY_COLUMNS: &str = "m.id, m.content, m.title, m.tags, m.embedding, m.embedding_model,
     m.context, m.platform, m.content_hash, m.created_at, m.updated_at, m.extracted";

pub fn insert_memory(conn: &Connection, memory: &MemoryRecord) -> SiftResult<()> {
    let tags_json = serde_json::to_string(&memory.tags)?;
    let blob = memory.embedding.as_deref().map(f32_vec_to_bytes);
    let dims = memory.embedding.as_ref().map(|e| e.len() as i64);

    conn.execute(
        "INSERT INTO memories (
            id, content, title, tags, embedding, embedding_dims, embedding_model,
            context, platform, content_hash, created_at, updated_at, extracted
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            memory.id,
            memory.content,
            memory.title,
            tags_json,
            blob,
            dims,
            memory.embedding_model,
            memory.context,
            memory.platform,
            memory.content_hash,
            fmt_ts(&memory.created_at),
            fmt_ts(&memory.updated_at),
            memory.extracted as i32,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn get_memory(conn: &Connection, id: &str) -> SiftResult<Option<MemoryRecord>> {
    let sql = format!("SELECT {MEMORY_COLUMNS} FROM memories m WHERE m.id = ?1");
    conn.query_row(&sql, params![id], parse_memory_row)
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))
}

/// Fetch several memories. Missing ids are skipped; order follows `ids`.
pub fn bulk_get(conn: &Connection, ids: &[String]) -> SiftResult<Vec<MemoryRecord>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {MEMORY_COLUMNS} FROM memories m WHERE m.id IN ({})",
        placeholders(ids.len())
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params_from_iter(ids.iter()), parse_memory_row)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut found = collect_rows(rows)?;

    found.sort_by_key(|m| ids.iter().position(|id| *id == m.id).unwrap_or(usize::MAX));
    Ok(found)
}

/// Replace content and tags; the old embedding and extraction no longer describe the row.
pub fn update_content(
    conn: &Connection,
    id: &str,
    content: &str,
    tags: &[String],
    updated_at: DateTime<Utc>,
) -> SiftResult<()> {
    let tags_json = serde_json::to_string(tags)?;
    let hash = sift_core::models::content_hash(content);
    let changed = conn
        .execute(
            "UPDATE memories
             SET content = ?2, tags = ?3, content_hash = ?4, updated_at = ?5,
                 embedding = NULL, embedding_dims = NULL, embedding_model = NULL,
                 extracted = 0
             WHERE id = ?1",
            params![id, content, tags_json, hash, fmt_ts(&updated_at)],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    ensure_changed(changed, id)
}

pub fn set_embedding(conn: &Connection, id: &str, embedding: &[f32], model: &str) -> SiftResult<()> {
    let changed = conn
        .execute(
            "UPDATE memories SET embedding = ?2, embedding_dims = ?3, embedding_model = ?4
             WHERE id = ?1",
            params![id, f32_vec_to_bytes(embedding), embedding.len() as i64, model],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    ensure_changed(changed, id)
}

pub fn mark_extracted(conn: &Connection, id: &str) -> SiftResult<()> {
    let changed = conn
        .execute("UPDATE memories SET extracted = 1 WHERE id = ?1", params![id])
        .map_err(|e| to_storage_err(e.to_string()))?;
    ensure_changed(changed, id)
}

fn ensure_changed(changed: usize, id: &str) -> SiftResult<()> {
    if changed == 0 {
        return Err(SiftError::MemoryNotFound { id: id.to_string() });
    }
    Ok(())
}

/// Map a row selected with [`MEMORY_COLUMNS`].
pub fn parse_memory_row(row: &Row<'_>) -> rusqlite::Result<MemoryRecord> {
    let tags_raw: String = row.get(3)?;
    let blob: Option<Vec<u8>> = row.get(4)?;
    let created_raw: String = row.get(9)?;
    let updated_raw: String = row.get(10)?;
    let extracted: i32 = row.get(11)?;

    Ok(MemoryRecord {
        id: row.get(0)?,
        content: row.get(1)?,
        title: row.get(2)?,
        tags: parse_string_list(3, &tags_raw)?,
        embedding: blob.map(|b| bytes_to_f32_vec(&b)),
        embedding_model: row.get(5)?,
        context: row.get(6)?,
        platform: row.get(7)?,
        content_hash: row.get(8)?,
        created_at: parse_ts(9, &created_raw)?,
        updated_at: parse_ts(10, &updated_raw)?,
        extracted: extracted != 0,
    })
}

/// Drain a mapped row iterator into a Vec.
pub(crate) fn collect_rows<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> SiftResult<Vec<T>> {
    rows.map(|r| r.map_err(|e| to_storage_err(e.to_string())))
        .collect()
}
