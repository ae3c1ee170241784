//! EntityGraphManager: the public face of the entity graph.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use sift_core::config::EntityConfig;
use sift_core::errors::{EntityError, SiftResult};
use sift_core::models::{Entity, ExtractionResult, MergeStats, MergeStrategy};
use sift_core::traits::{IGraphStore, IMemoryStore, ITextGenerator};

use crate::bulk::{BulkDedupReport, BulkFailure, MergedPair, ReviewItem};
use crate::detection::{self, union_pairs, DetectionMethod, DuplicatePair};
use crate::ingest::{self, IngestReport};
use crate::merge_plan::build_merge_plan;
use crate::timeline::{sort_newest_first, EntityTimeline, TimelineEvent, TimelineEventKind};

/// Forwarding chains are repointed on every merge, so real chains are one hop.
/// The bound only protects against a corrupted index.
const MAX_FORWARD_HOPS: usize = 32;

pub struct EntityGraphManager {
    graph: Arc<dyn IGraphStore>,
    memories: Arc<dyn IMemoryStore>,
    generator: Option<Arc<dyn ITextGenerator>>,
    config: EntityConfig,
}

impl EntityGraphManager {
    pub fn new(
        graph: Arc<dyn IGraphStore>,
        memories: Arc<dyn IMemoryStore>,
        config: EntityConfig,
    ) -> Self {
        Self {
            graph,
            memories,
            generator: None,
            config,
        }
    }

    /// Enable the AI alias-grouping detector.
    pub fn with_generator(mut self, generator: Arc<dyn ITextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn config(&self) -> &EntityConfig {
        &self.config
    }

    /// Candidate duplicate pairs from every detector, highest confidence first.
    /// `threshold` overrides the configured fuzzy-name threshold.
    #[instrument(skip(self))]
    pub fn find_duplicate_entities(&self, threshold: Option<f64>) -> SiftResult<Vec<DuplicatePair>> {
        let entities = self.graph.list_entities()?;
        let threshold = threshold.unwrap_or(self.config.fuzzy_threshold);

        let exact = detection::exact::detect(&entities);
        let fuzzy = detection::fuzzy::detect(&entities, threshold);
        let ai = match (&self.generator, self.config.ai_grouping) {
            (Some(generator), true) if generator.is_available() => detection::ai_grouping::detect(
                generator.as_ref(),
                &entities,
                self.config.ai_alias_confidence,
                self.config.ai_grouping_batch,
            ),
            (Some(_), true) => {
                warn!("text generator unavailable, alias grouping skipped");
                Vec::new()
            }
            _ => Vec::new(),
        };

        debug!(
            entities = entities.len(),
            exact = exact.len(),
            fuzzy = fuzzy.len(),
            ai = ai.len(),
            "duplicate entity detection"
        );
        Ok(union_pairs(vec![exact, fuzzy, ai]))
    }

    /// Merge `secondary_id` into `primary_id` atomically. Ids are taken
    /// literally: a retired id is not followed and reports `NotFound`.
    #[instrument(skip(self))]
    pub fn merge_entities(
        &self,
        primary_id: &str,
        secondary_id: &str,
        strategy: MergeStrategy,
    ) -> SiftResult<MergeStats> {
        if primary_id == secondary_id {
            return Err(EntityError::MergeConflict {
                reason: format!("cannot merge entity {primary_id} into itself"),
            }
            .into());
        }
        let primary = self.require_entity(primary_id)?;
        let secondary = self.require_entity(secondary_id)?;

        let plan = build_merge_plan(&primary, &secondary, strategy, Utc::now());
        let stats = self.graph.apply_merge(&plan)?;
        info!(
            primary = %primary.name,
            secondary = %secondary.name,
            %strategy,
            memories = stats.memories_affected,
            relations = stats.relations_affected,
            skipped = stats.duplicates_skipped,
            "entities merged"
        );
        Ok(stats)
    }

    fn require_entity(&self, id: &str) -> SiftResult<Entity> {
        self.graph
            .get_entity(id)?
            .ok_or_else(|| EntityError::NotFound { id: id.to_string() }.into())
    }

    /// Creation, mentions and merges of an entity, newest first. Retired ids
    /// are followed to their survivor.
    #[instrument(skip(self))]
    pub fn get_entity_timeline(&self, entity_id: &str) -> SiftResult<EntityTimeline> {
        let Some(current_id) = self.resolve_entity_id(entity_id)? else {
            return Ok(EntityTimeline::not_found(entity_id));
        };
        let Some(entity) = self.graph.get_entity(&current_id)? else {
            return Ok(EntityTimeline::not_found(entity_id));
        };

        let mut events = vec![TimelineEvent {
            at: entity.created_at,
            kind: TimelineEventKind::Created,
        }];

        let associations = self.graph.associations_for_entities(&[current_id.clone()])?;
        let memory_ids: Vec<String> = associations.iter().map(|a| a.memory_id.clone()).collect();
        let created: HashMap<String, DateTime<Utc>> = self
            .memories
            .get_memories(&memory_ids)?
            .into_iter()
            .map(|m| (m.id, m.created_at))
            .collect();
        for association in associations {
            let Some(at) = created.get(&association.memory_id).copied() else {
                continue;
            };
            events.push(TimelineEvent {
                at,
                kind: TimelineEventKind::Mentioned {
                    memory_id: association.memory_id,
                    relevance: association.relevance,
                },
            });
        }

        for entry in self.graph.merge_history_for(&current_id)? {
            let kind = if entry.primary_id == current_id {
                TimelineEventKind::Absorbed {
                    secondary_id: entry.secondary_id,
                    secondary_name: entry.secondary_name,
                    strategy: entry.strategy,
                }
            } else {
                TimelineEventKind::MergedInto {
                    primary_id: entry.primary_id,
                    strategy: entry.strategy,
                }
            };
            events.push(TimelineEvent {
                at: entry.merged_at,
                kind,
            });
        }

        sort_newest_first(&mut events);
        Ok(EntityTimeline {
            query_id: entity_id.to_string(),
            found: true,
            entity: Some(entity),
            events,
        })
    }

    /// Detect duplicates and merge the confident ones. Pairs below the
    /// threshold, or every pair when `auto_merge` is off, are returned for
    /// review. Merge failures are collected, not raised.
    #[instrument(skip(self))]
    pub fn bulk_deduplicate(
        &self,
        auto_merge: bool,
        confidence_threshold: Option<f64>,
    ) -> SiftResult<BulkDedupReport> {
        let threshold = confidence_threshold.unwrap_or(self.config.bulk_confidence_threshold);
        let pairs = self.find_duplicate_entities(None)?;
        let mut report = BulkDedupReport {
            candidates: pairs.len(),
            ..Default::default()
        };

        for pair in pairs {
            if !auto_merge || pair.confidence < threshold {
                report.manual_review.push(ReviewItem {
                    reason: pair.reason(),
                    primary_id: pair.primary_id,
                    primary_name: pair.primary_name,
                    secondary_id: pair.secondary_id,
                    secondary_name: pair.secondary_name,
                    confidence: pair.confidence,
                    method: pair.method,
                });
                continue;
            }

            let strategy = match pair.method {
                DetectionMethod::AiAlias => MergeStrategy::Combine,
                DetectionMethod::ExactName | DetectionMethod::FuzzyName => MergeStrategy::KeepPrimary,
            };
            match self.merge_resolved(&pair, strategy) {
                Ok(Some(merged)) => report.merged.push(merged),
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    warn!(primary = %pair.primary_id, secondary = %pair.secondary_id, error = %e, "bulk merge failed");
                    report.failures.push(BulkFailure {
                        primary_id: pair.primary_id,
                        secondary_id: pair.secondary_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            candidates = report.candidates,
            merged = report.merged.len(),
            review = report.manual_review.len(),
            skipped = report.skipped,
            failed = report.failures.len(),
            "bulk entity deduplication finished"
        );
        Ok(report)
    }

    /// Merge a detected pair after following earlier merges of this run.
    /// `None` when both sides already resolve to one entity.
    fn merge_resolved(&self, pair: &DuplicatePair, strategy: MergeStrategy) -> SiftResult<Option<MergedPair>> {
        let primary = self.resolve_entity_id(&pair.primary_id)?;
        let secondary = self.resolve_entity_id(&pair.secondary_id)?;
        let (Some(primary), Some(secondary)) = (primary, secondary) else {
            return Err(EntityError::NotFound {
                id: format!("{} / {}", pair.primary_id, pair.secondary_id),
            }
            .into());
        };
        if primary == secondary {
            return Ok(None);
        }

        // Re-orient: forwarding may have swapped which side is older.
        let a = self.require_entity(&primary)?;
        let b = self.require_entity(&secondary)?;
        let oriented = DuplicatePair::oriented(&a, &b, pair.confidence, pair.method);

        let stats = self.merge_entities(&oriented.primary_id, &oriented.secondary_id, strategy)?;
        Ok(Some(MergedPair {
            primary_id: oriented.primary_id,
            secondary_id: oriented.secondary_id,
            strategy,
            confidence: pair.confidence,
            stats,
        }))
    }

    /// Follow forwarding entries from `id` to a live entity. `None` when the
    /// id was never an entity.
    pub fn resolve_entity_id(&self, id: &str) -> SiftResult<Option<String>> {
        let mut current = id.to_string();
        let mut seen = HashSet::new();
        for _ in 0..MAX_FORWARD_HOPS {
            if self.graph.get_entity(&current)?.is_some() {
                return Ok(Some(current));
            }
            if !seen.insert(current.clone()) {
                break;
            }
            match self.graph.forwarded_to(&current)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        warn!(id, "forwarding chain did not end at a live entity");
        Ok(None)
    }

    /// Upsert the extractor's entities for one memory and mark it extracted.
    #[instrument(skip(self, extraction), fields(entities = extraction.entities.len()))]
    pub fn ingest_extraction(
        &self,
        memory_id: &str,
        extraction: &ExtractionResult,
    ) -> SiftResult<IngestReport> {
        ingest::ingest_extraction(self.graph.as_ref(), self.memories.as_ref(), memory_id, extraction)
    }
}
