//! Embedding blob codec and brute-force cosine search.

use rusqlite::{params, Connection};

use sift_core::errors::{EmbeddingError, SiftResult};
use sift_core::models::MemoryRecord;
use sift_core::similarity::cosine_similarity;

use super::memory_crud::{parse_memory_row, MEMORY_COLUMNS};
use crate::to_storage_err;

/// Scan embedded memories and return the `limit` most similar to `query`.
/// Pairs with non-positive similarity are dropped.
pub fn search_vector(
    conn: &Connection,
    query: &[f32],
    context: Option<&str>,
    limit: usize,
) -> SiftResult<Vec<(MemoryRecord, f64)>> {
    if query.iter().all(|x| *x == 0.0) {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT {MEMORY_COLUMNS}, m.embedding_dims FROM memories m
         WHERE m.embedding IS NOT NULL AND (?1 IS NULL OR m.context = ?1)"
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![context], |row| {
            let memory = parse_memory_row(row)?;
            let dims: Option<i64> = row.get(12)?;
            Ok((memory, dims))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut scored = Vec::new();
    for row in rows {
        let (memory, dims) = row.map_err(|e| to_storage_err(e.to_string()))?;
        let dims = dims.unwrap_or_default() as usize;
        if dims != query.len() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: query.len(),
                actual: dims,
            }
            .into());
        }
        let Some(stored) = memory.embedding.as_deref() else {
            continue;
        };
        let sim = cosine_similarity(query, stored)?;
        if sim > 0.0 {
            scored.push((memory, sim));
        }
    }

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    Ok(scored)
}

/// Convert f32 slice to bytes (little-endian).
pub fn f32_vec_to_bytes(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert bytes back to an f32 vec. Trailing partial words are ignored.
pub fn bytes_to_f32_vec(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_codec_is_little_endian() {
        let bytes = f32_vec_to_bytes(&[1.0]);
        assert_eq!(bytes, 1.0f32.to_le_bytes().to_vec());
        assert_eq!(bytes_to_f32_vec(&bytes), vec![1.0]);
    }
}
