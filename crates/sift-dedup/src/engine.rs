//! DeduplicationEngine: the write path with near-duplicate detection.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, instrument, warn};

use sift_core::config::DedupConfig;
use sift_core::constants::DUPLICATE_PREVIEW_CHARS;
use sift_core::errors::{EmbeddingError, SiftError, SiftResult};
use sift_core::models::{
    DedupOutcome, DuplicateCandidate, DuplicateDecision, DuplicateOption, ExactDuplicateGroup,
    MemoryMergeStrategy, MemoryRecord, NewMemory,
};
use sift_core::similarity::{cosine_similarity, ensure_dimensions};
use sift_core::traits::{IEmbeddingGateway, IMemoryStore, ITextGenerator};

use crate::exact::group_exact_duplicates;
use crate::merge::{append_with_separator, smart_merge_prompt, union_tags, MergeResult};

/// Outcome of a duplicate check, including the document embedding it computed.
#[derive(Debug, Clone, Default)]
pub struct DuplicateCheck {
    pub candidate: Option<DuplicateCandidate>,
    /// Embedding of the checked content; `None` when the check was skipped.
    pub embedding: Option<Vec<f32>>,
}

pub struct DeduplicationEngine {
    store: Arc<dyn IMemoryStore>,
    gateway: Option<Arc<dyn IEmbeddingGateway>>,
    generator: Option<Arc<dyn ITextGenerator>>,
    config: DedupConfig,
}

impl DeduplicationEngine {
    pub fn new(
        store: Arc<dyn IMemoryStore>,
        gateway: Option<Arc<dyn IEmbeddingGateway>>,
        config: DedupConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            generator: None,
            config,
        }
    }

    /// Enable the `smart` merge strategy.
    pub fn with_generator(mut self, generator: Arc<dyn ITextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// Most similar recent memory above the threshold, or `None`.
    /// An unavailable or failing gateway skips the check.
    pub fn check_duplicate(
        &self,
        content: &str,
        context: &str,
        platform: Option<&str>,
        window_secs: Option<u64>,
    ) -> SiftResult<Option<DuplicateCandidate>> {
        Ok(self.check(content, context, platform, window_secs)?.candidate)
    }

    #[instrument(skip(self, content))]
    fn check(
        &self,
        content: &str,
        context: &str,
        platform: Option<&str>,
        window_secs: Option<u64>,
    ) -> SiftResult<DuplicateCheck> {
        let Some(embedding) = self.embed_for_check(content)? else {
            return Ok(DuplicateCheck::default());
        };

        let window = self.config.resolve_window(window_secs, context, platform);
        let since = window_start(Utc::now(), window);
        let recent = self.store.recent_with_embeddings(context, since)?;

        let mut best: Option<DuplicateCandidate> = None;
        for memory in &recent {
            let Some(stored) = memory.embedding.as_deref() else {
                continue;
            };
            let similarity = cosine_similarity(&embedding, stored)?;
            if similarity <= self.config.similarity_threshold {
                continue;
            }
            if best.as_ref().map_or(true, |b| similarity > b.similarity) {
                best = Some(DuplicateCandidate {
                    memory_id: memory.id.clone(),
                    similarity,
                    created_at: memory.created_at,
                });
            }
        }

        debug!(
            window,
            scanned = recent.len(),
            found = best.is_some(),
            "duplicate check finished"
        );
        Ok(DuplicateCheck {
            candidate: best,
            embedding: Some(embedding),
        })
    }

    /// Document embedding for `content`, `None` if the gateway cannot serve it.
    fn embed_for_check(&self, content: &str) -> SiftResult<Option<Vec<f32>>> {
        let Some(gateway) = &self.gateway else {
            return Ok(None);
        };
        if !gateway.is_available() {
            warn!("embedding gateway unavailable, skipping duplicate check");
            return Ok(None);
        }
        let vectors = match gateway.embed_texts(&[content.to_string()]) {
            Ok(vectors) => vectors,
            Err(SiftError::EmbeddingError(e @ EmbeddingError::DimensionMismatch { .. })) => {
                return Err(e.into())
            }
            Err(e) => {
                warn!(error = %e, "embedding failed, skipping duplicate check");
                return Ok(None);
            }
        };
        let Some(vector) = vectors.into_iter().next() else {
            warn!("embedding gateway returned no vector, skipping duplicate check");
            return Ok(None);
        };
        ensure_dimensions(&vector, gateway.dimensions())?;
        Ok(Some(vector))
    }

    /// Write `request` unless a near-duplicate exists. Auto-captured
    /// duplicates above the auto-merge threshold are merged in place; any
    /// other duplicate is returned to the caller as a decision.
    #[instrument(skip(self, request))]
    pub fn create_with_dedup(
        &self,
        request: NewMemory,
        force: bool,
        strategy: MemoryMergeStrategy,
    ) -> SiftResult<DedupOutcome> {
        if request.content.trim().is_empty() {
            return Err(SiftError::InvalidArgument {
                reason: "memory content is empty".into(),
            });
        }
        if force {
            let record = self.write_new(request, None)?;
            return Ok(DedupOutcome::Created {
                memory_id: record.id,
            });
        }

        let context = request.context_or_default().to_string();
        let check = self.check(&request.content, &context, request.platform.as_deref(), None)?;

        let Some(candidate) = check.candidate else {
            let record = self.write_new(request, check.embedding)?;
            return Ok(DedupOutcome::Created {
                memory_id: record.id,
            });
        };

        let existing = self
            .store
            .get_memory(&candidate.memory_id)?
            .ok_or_else(|| SiftError::MemoryNotFound {
                id: candidate.memory_id.clone(),
            })?;

        if candidate.similarity > self.config.auto_merge_threshold
            && existing.has_tag(&self.config.auto_capture_tag)
        {
            let merged = self.update_or_merge(&existing.id, &request.content, &request.tags, strategy)?;
            info!(
                memory_id = %merged.memory_id,
                similarity = candidate.similarity,
                applied = %merged.applied,
                "auto-merged duplicate capture"
            );
            return Ok(DedupOutcome::Merged {
                memory_id: merged.memory_id,
                similarity: candidate.similarity_percent(),
                strategy: merged.applied,
            });
        }

        Ok(DedupOutcome::DuplicateFound(DuplicateDecision {
            existing_id: existing.id.clone(),
            similarity: candidate.similarity_percent(),
            existing_created_at: existing.created_at,
            existing_preview: existing.preview(DUPLICATE_PREVIEW_CHARS),
            options: vec![
                DuplicateOption::Update,
                DuplicateOption::Force,
                DuplicateOption::Skip,
            ],
        }))
    }

    fn write_new(&self, request: NewMemory, embedding: Option<Vec<f32>>) -> SiftResult<MemoryRecord> {
        let mut record = request.into_record(Utc::now());
        if let (Some(vector), Some(gateway)) = (embedding, &self.gateway) {
            record.embedding = Some(vector);
            record.embedding_model = Some(gateway.model_name().to_string());
        }
        self.store.insert_memory(&record)?;
        debug!(memory_id = %record.id, embedded = record.embedding.is_some(), "memory written");
        Ok(record)
    }

    /// Fold `new_content` into an existing memory. Tags are unioned and the
    /// stored embedding is cleared because the content changed.
    #[instrument(skip(self, new_content, new_tags))]
    pub fn update_or_merge(
        &self,
        memory_id: &str,
        new_content: &str,
        new_tags: &[String],
        strategy: MemoryMergeStrategy,
    ) -> SiftResult<MergeResult> {
        let existing = self
            .store
            .get_memory(memory_id)?
            .ok_or_else(|| SiftError::MemoryNotFound {
                id: memory_id.to_string(),
            })?;
        let now = Utc::now();

        let (content, applied) = match strategy {
            MemoryMergeStrategy::Append => (
                append_with_separator(&existing.content, new_content, now),
                MemoryMergeStrategy::Append,
            ),
            MemoryMergeStrategy::Replace => (new_content.to_string(), MemoryMergeStrategy::Replace),
            MemoryMergeStrategy::Smart => match self.smart_merge(&existing.content, new_content) {
                Some(merged) => (merged, MemoryMergeStrategy::Smart),
                None => (
                    append_with_separator(&existing.content, new_content, now),
                    MemoryMergeStrategy::Append,
                ),
            },
        };
        let tags = union_tags(&existing.tags, new_tags);

        self.store.update_content(memory_id, &content, &tags, now)?;
        Ok(MergeResult {
            memory_id: memory_id.to_string(),
            applied,
            content,
            tags,
        })
    }

    /// Generator-reconciled text, or `None` to fall back to append.
    fn smart_merge(&self, existing: &str, incoming: &str) -> Option<String> {
        let Some(generator) = self.generator.as_ref().filter(|g| g.is_available()) else {
            warn!("smart merge requested without an available generator, appending instead");
            return None;
        };
        match generator.generate(&smart_merge_prompt(existing, incoming)) {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => {
                warn!("smart merge returned empty text, appending instead");
                None
            }
            Err(e) => {
                warn!(error = %e, "smart merge failed, appending instead");
                None
            }
        }
    }

    /// Groups of memories with identical normalized content.
    #[instrument(skip(self))]
    pub fn find_exact_duplicates(
        &self,
        context: Option<&str>,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> SiftResult<Vec<ExactDuplicateGroup>> {
        let (from, to) = range.unwrap_or_else(|| {
            (
                DateTime::<Utc>::UNIX_EPOCH,
                Utc::now() + Duration::days(1),
            )
        });
        let memories = self.store.memories_between(context, from, to)?;
        let groups = group_exact_duplicates(&memories);
        debug!(scanned = memories.len(), groups = groups.len(), "exact duplicate sweep");
        Ok(groups)
    }
}

/// Lower bound of the dedup window. Windows beyond what chrono can represent,
/// or reaching past the epoch, scan from the epoch.
fn window_start(now: DateTime<Utc>, window_secs: u64) -> DateTime<Utc> {
    i64::try_from(window_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|window| now.checked_sub_signed(window))
        .map_or(DateTime::<Utc>::UNIX_EPOCH, |since| since.max(DateTime::<Utc>::UNIX_EPOCH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_start_saturates_at_the_epoch() {
        let now = Utc::now();
        assert_eq!(window_start(now, 300), now - Duration::seconds(300));
        assert_eq!(window_start(now, u64::MAX), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(window_start(now, 10_000_000_000_000_000), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(window_start(now, 0), now);
    }
}
