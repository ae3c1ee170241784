//! Memories written close in time to the source, same context.

use chrono::Duration;

use sift_core::errors::SiftResult;
use sift_core::models::{MemoryRecord, StrategyHit};
use sift_core::traits::IMemoryStore;

use super::sort_hits;

/// score = max(0, 1 − |Δhours| / window_hours). Zero scores are dropped.
pub fn recommend(
    store: &dyn IMemoryStore,
    source: &MemoryRecord,
    window_hours: f64,
) -> SiftResult<Vec<StrategyHit>> {
    if window_hours <= 0.0 {
        return Ok(Vec::new());
    }
    let span = Duration::milliseconds((window_hours * 3_600_000.0) as i64);
    let from = source.created_at - span;
    let to = source.created_at + span;

    let mut hits = Vec::new();
    for candidate in store.memories_between(Some(&source.context), from, to)? {
        if candidate.id == source.id {
            continue;
        }
        let hours = (candidate.created_at - source.created_at).num_milliseconds().abs() as f64 / 3_600_000.0;
        let score = (1.0 - hours / window_hours).max(0.0);
        if score > 0.0 {
            hits.push(StrategyHit::new(
                candidate.id,
                score,
                format!("written {hours:.1}h apart"),
            ));
        }
    }
    sort_hits(&mut hits);
    Ok(hits)
}
