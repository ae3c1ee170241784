//! Folding extractor output into the graph.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sift_core::errors::{SiftError, SiftResult};
use sift_core::models::{Entity, ExtractionResult, MemoryEntityAssociation, Relation};
use sift_core::traits::{IGraphStore, IMemoryStore};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub entities_created: usize,
    pub entities_matched: usize,
    pub associations: usize,
    pub relations_added: usize,
    /// Relations naming an entity absent from the extraction and the graph.
    pub relations_unresolved: usize,
}

/// Upsert extracted entities, replace the memory's associations, insert
/// relations idempotently and mark the memory extracted.
pub(crate) fn ingest_extraction(
    graph: &dyn IGraphStore,
    memories: &dyn IMemoryStore,
    memory_id: &str,
    extraction: &ExtractionResult,
) -> SiftResult<IngestReport> {
    if memories.get_memory(memory_id)?.is_none() {
        return Err(SiftError::MemoryNotFound {
            id: memory_id.to_string(),
        });
    }

    let mut report = IngestReport::default();
    // lower-cased name → entity id, for relation endpoints
    let mut resolved: HashMap<String, String> = HashMap::new();
    let mut relevance: HashMap<String, f64> = HashMap::new();

    for extracted in &extraction.entities {
        let name = extracted.name.trim();
        if name.is_empty() {
            continue;
        }
        let key = name.to_lowercase();
        let entity_id = match resolved.get(&key) {
            Some(id) => id.clone(),
            None => {
                let id = upsert_entity(graph, name, &extracted.entity_type, &extracted.description, &mut report)?;
                resolved.insert(key, id.clone());
                id
            }
        };
        let score = extracted.relevance.clamp(0.0, 1.0);
        relevance
            .entry(entity_id)
            .and_modify(|r| *r = r.max(score))
            .or_insert(score);
    }

    let mut associations: Vec<MemoryEntityAssociation> = relevance
        .into_iter()
        .map(|(entity_id, relevance)| MemoryEntityAssociation {
            memory_id: memory_id.to_string(),
            entity_id,
            relevance,
        })
        .collect();
    associations.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
    graph.replace_associations(memory_id, &associations)?;
    report.associations = associations.len();

    for relation in &extraction.relations {
        let (Some(from), Some(to)) = (
            endpoint(graph, &resolved, &relation.from)?,
            endpoint(graph, &resolved, &relation.to)?,
        ) else {
            report.relations_unresolved += 1;
            debug!(from = %relation.from, to = %relation.to, "relation endpoint unknown, dropped");
            continue;
        };
        if from == to {
            continue;
        }
        let edge = Relation {
            from_entity: from,
            to_entity: to,
            relation_type: relation.relation_type.trim().to_string(),
        };
        if graph.add_relation(&edge)? {
            report.relations_added += 1;
        }
    }

    memories.mark_extracted(memory_id)?;
    debug!(
        memory_id,
        created = report.entities_created,
        matched = report.entities_matched,
        relations = report.relations_added,
        "extraction ingested"
    );
    Ok(report)
}

/// Existing entity with this name (or alias) and type, else a new one.
fn upsert_entity(
    graph: &dyn IGraphStore,
    name: &str,
    entity_type: &str,
    description: &str,
    report: &mut IngestReport,
) -> SiftResult<String> {
    let existing = graph
        .find_entities_by_name(name)?
        .into_iter()
        .find(|e| e.entity_type.eq_ignore_ascii_case(entity_type));

    if let Some(mut entity) = existing {
        report.entities_matched += 1;
        if entity.description.is_empty() && !description.trim().is_empty() {
            entity.description = description.trim().to_string();
            entity.updated_at = Utc::now();
            graph.update_entity(&entity)?;
        }
        return Ok(entity.id);
    }

    let mut entity = Entity::new(name, entity_type, Utc::now());
    entity.description = description.trim().to_string();
    graph.insert_entity(&entity)?;
    report.entities_created += 1;
    Ok(entity.id)
}

fn endpoint(
    graph: &dyn IGraphStore,
    resolved: &HashMap<String, String>,
    name: &str,
) -> SiftResult<Option<String>> {
    let key = name.trim().to_lowercase();
    if let Some(id) = resolved.get(&key) {
        return Ok(Some(id.clone()));
    }
    Ok(graph.find_entities_by_name(name.trim())?.into_iter().next().map(|e| e.id))
}
