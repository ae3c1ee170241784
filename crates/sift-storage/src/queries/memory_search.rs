//! FTS5 full-text search queries.

use rusqlite::{params, Connection};

use sift_core::errors::SiftResult;
use sift_core::models::MemoryRecord;

use super::memory_crud::{parse_memory_row, MEMORY_COLUMNS};
use crate::to_storage_err;

/// Search memories with FTS5. Scores are the negated BM25 rank, so higher is better.
pub fn search_fts5(
    conn: &Connection,
    query: &str,
    context: Option<&str>,
    limit: usize,
) -> SiftResult<Vec<(MemoryRecord, f64)>> {
    let Some(match_expr) = to_match_expression(query) else {
        return Ok(Vec::new());
    };

    let sql = format!(
        "SELECT {MEMORY_COLUMNS}, bm25(memory_fts) AS rank
         FROM memory_fts
         JOIN memories m ON m.rowid = memory_fts.rowid
         WHERE memory_fts MATCH ?1
           AND (?2 IS NULL OR m.context = ?2)
         ORDER BY rank ASC
         LIMIT ?3"
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![match_expr, context, limit as i64], |row| {
            let memory = parse_memory_row(row)?;
            let rank: f64 = row.get(12)?;
            Ok((memory, -rank))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row.map_err(|e| to_storage_err(e.to_string()))?);
    }
    Ok(results)
}

/// Turn free text into an OR of quoted terms so user input never hits FTS5 syntax.
fn to_match_expression(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"", t.to_lowercase()))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}
