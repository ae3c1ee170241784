//! Memories associated with a named entity.

use sift_core::errors::SiftResult;
use sift_core::models::{EntitySearchHit, EntitySearchResult};
use sift_core::traits::IGraphStore;

/// Case-insensitive match on name or alias; the oldest matching entity wins.
/// Memories come back most relevant first.
pub fn search_by_entity(graph: &dyn IGraphStore, name: &str) -> SiftResult<EntitySearchResult> {
    let query = name.trim();
    if query.is_empty() {
        return Ok(EntitySearchResult::not_found(name));
    }
    let Some(entity) = graph.find_entities_by_name(query)?.into_iter().next() else {
        return Ok(EntitySearchResult::not_found(query));
    };

    let mut memories: Vec<EntitySearchHit> = graph
        .associations_for_entities(&[entity.id.clone()])?
        .into_iter()
        .map(|a| EntitySearchHit {
            memory_id: a.memory_id,
            relevance: a.relevance,
        })
        .collect();
    memories.sort_by(|a, b| {
        b.relevance
            .total_cmp(&a.relevance)
            .then_with(|| a.memory_id.cmp(&b.memory_id))
    });

    Ok(EntitySearchResult {
        query: query.to_string(),
        found: true,
        entity: Some(entity),
        memories,
        message: None,
    })
}
