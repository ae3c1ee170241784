//! Memories mentioning entities related to the source's entities.

use std::collections::{BTreeMap, HashMap};

use sift_core::errors::SiftResult;
use sift_core::models::{MemoryRecord, StrategyHit};
use sift_core::traits::IGraphStore;

use super::sort_hits;
use crate::relation_graph::RelationGraph;

/// score = Σ 1/hop over the related entities a candidate mentions. Entities
/// at two hops exclude those already at one hop, and the source's own
/// entities never count.
pub fn recommend(
    graph: &dyn IGraphStore,
    source: &MemoryRecord,
    max_hops: usize,
) -> SiftResult<Vec<StrategyHit>> {
    let seeds: Vec<String> = graph
        .associations_for_memory(&source.id)?
        .into_iter()
        .map(|a| a.entity_id)
        .collect();
    if seeds.is_empty() {
        return Ok(Vec::new());
    }

    let neighbourhood = RelationGraph::load(graph, &seeds, max_hops)?;
    let hops: HashMap<String, usize> = neighbourhood.hop_distances(&seeds, max_hops);
    if hops.is_empty() {
        return Ok(Vec::new());
    }

    let related: Vec<String> = hops.keys().cloned().collect();
    let mut scores: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for association in graph.associations_for_entities(&related)? {
        if association.memory_id == source.id {
            continue;
        }
        let Some(hop) = hops.get(&association.entity_id) else {
            continue;
        };
        let entry = scores.entry(association.memory_id).or_default();
        entry.0 += 1.0 / *hop as f64;
        entry.1 += 1;
    }

    let mut hits: Vec<StrategyHit> = scores
        .into_iter()
        .map(|(memory_id, (score, count))| {
            let noun = if count == 1 { "entity" } else { "entities" };
            StrategyHit::new(memory_id, score, format!("mentions {count} related {noun}"))
        })
        .collect();
    sort_hits(&mut hits);
    Ok(hits)
}
