//! Memories sharing entities with the source.

use std::collections::{BTreeMap, HashSet};

use sift_core::errors::SiftResult;
use sift_core::models::{MemoryRecord, StrategyHit};
use sift_core::traits::IGraphStore;

use super::sort_hits;

const SHARED_COUNT_WEIGHT: f64 = 0.7;
const RELEVANCE_WEIGHT: f64 = 0.3;

/// score = 0.7 × shared entities + 0.3 × mean relevance of the candidate's
/// associations with those entities.
pub fn recommend(graph: &dyn IGraphStore, source: &MemoryRecord) -> SiftResult<Vec<StrategyHit>> {
    let source_entities: Vec<String> = graph
        .associations_for_memory(&source.id)?
        .into_iter()
        .map(|a| a.entity_id)
        .collect();
    if source_entities.is_empty() {
        return Ok(Vec::new());
    }

    // memory → (distinct shared entities, relevance sum)
    let mut shared: BTreeMap<String, (HashSet<String>, f64)> = BTreeMap::new();
    for association in graph.associations_for_entities(&source_entities)? {
        if association.memory_id == source.id {
            continue;
        }
        let entry = shared.entry(association.memory_id).or_default();
        if entry.0.insert(association.entity_id) {
            entry.1 += association.relevance;
        }
    }

    let mut hits: Vec<StrategyHit> = shared
        .into_iter()
        .map(|(memory_id, (entities, relevance_sum))| {
            let count = entities.len();
            let mean = relevance_sum / count as f64;
            let score = SHARED_COUNT_WEIGHT * count as f64 + RELEVANCE_WEIGHT * mean;
            let noun = if count == 1 { "entity" } else { "entities" };
            StrategyHit::new(memory_id, score, format!("shares {count} {noun}"))
        })
        .collect();
    sort_hits(&mut hits);
    Ok(hits)
}
