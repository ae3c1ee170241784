//! Embedding similarity within the source's context.

use sift_core::errors::SiftResult;
use sift_core::models::{MemoryRecord, StrategyHit};
use sift_core::similarity::cosine_similarity;
use sift_core::traits::IMemoryStore;

use super::sort_hits;

/// Candidates with cosine similarity ≥ `threshold`. A source without an
/// embedding yields nothing; a dimension mismatch is an error.
pub fn recommend(
    store: &dyn IMemoryStore,
    source: &MemoryRecord,
    threshold: f64,
) -> SiftResult<Vec<StrategyHit>> {
    let Some(query) = source.embedding.as_deref() else {
        return Ok(Vec::new());
    };

    let mut hits = Vec::new();
    for candidate in store.embedded_in_context(&source.context)? {
        if candidate.id == source.id {
            continue;
        }
        let Some(vector) = candidate.embedding.as_deref() else {
            continue;
        };
        let similarity = cosine_similarity(query, vector)?;
        if similarity >= threshold {
            hits.push(StrategyHit::new(
                candidate.id,
                similarity,
                format!("{:.0}% similar content", similarity * 100.0),
            ));
        }
    }
    sort_hits(&mut hits);
    Ok(hits)
}
