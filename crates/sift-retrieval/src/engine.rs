//! RetrievalFusion: recommendations, hybrid search and entity lookup over the store.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use sift_core::config::RetrievalConfig;
use sift_core::constants::MAX_RELATION_HOPS;
use sift_core::errors::{EmbeddingError, SiftError, SiftResult};
use sift_core::models::{
    Degradation, EntitySearchResult, FusedRecommendation, RankedHit, SearchResponse, StrategyHit,
    StrategyKind,
};
use sift_core::similarity::{cosine_similarity, ensure_dimensions};
use sift_core::traits::{IEmbeddingGateway, IGraphStore, IMemoryStore};

use crate::entity_search;
use crate::fusion::fuse_strategies;
use crate::hybrid::combine_scores;
use crate::rrf::reciprocal_rank_fusion;
use crate::strategies;

pub struct RetrievalFusion {
    memories: Arc<dyn IMemoryStore>,
    graph: Arc<dyn IGraphStore>,
    gateway: Option<Arc<dyn IEmbeddingGateway>>,
    config: RetrievalConfig,
}

impl RetrievalFusion {
    pub fn new(
        memories: Arc<dyn IMemoryStore>,
        graph: Arc<dyn IGraphStore>,
        gateway: Option<Arc<dyn IEmbeddingGateway>>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            memories,
            graph,
            gateway,
            config,
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Memories related to `memory_id`, fused across the four strategies.
    /// The strategies share no data and run in parallel.
    #[instrument(skip(self))]
    pub fn get_recommendations(
        &self,
        memory_id: &str,
        limit: usize,
    ) -> SiftResult<Vec<FusedRecommendation>> {
        let source = self
            .memories
            .get_memory(memory_id)?
            .ok_or_else(|| SiftError::MemoryNotFound {
                id: memory_id.to_string(),
            })?;

        let graph = self.graph.as_ref();
        let memories = self.memories.as_ref();
        let config = &self.config;
        let ((entity, relation), (content, temporal)) = rayon::join(
            || {
                rayon::join(
                    || strategies::entity::recommend(graph, &source),
                    || strategies::relation::recommend(graph, &source, MAX_RELATION_HOPS),
                )
            },
            || {
                rayon::join(
                    || strategies::content::recommend(memories, &source, config.content_threshold),
                    || strategies::temporal::recommend(memories, &source, config.temporal_window_hours),
                )
            },
        );

        let results: Vec<(StrategyKind, Vec<StrategyHit>)> = vec![
            (StrategyKind::Entity, entity?),
            (StrategyKind::Relation, relation?),
            (StrategyKind::Content, content?),
            (StrategyKind::Temporal, temporal?),
        ];
        debug!(
            entity = results[0].1.len(),
            relation = results[1].1.len(),
            content = results[2].1.len(),
            temporal = results[3].1.len(),
            "strategy hits"
        );
        Ok(fuse_strategies(&results, &config.weights, limit))
    }

    /// Combine caller-supplied keyword results with semantic similarity of
    /// candidate embeddings to the query. The query embedding is computed
    /// before any candidate is scored.
    #[instrument(skip(self, keyword_results, semantic_candidates))]
    pub fn hybrid_search(
        &self,
        query: &str,
        keyword_results: &[(String, f64)],
        semantic_candidates: &[(String, Vec<f32>)],
        keyword_weight: Option<f64>,
        semantic_weight: Option<f64>,
    ) -> SiftResult<Vec<RankedHit>> {
        let query_vector = self.embed_query(query)?;
        let mut semantic = Vec::with_capacity(semantic_candidates.len());
        for (id, vector) in semantic_candidates {
            semantic.push((id.clone(), cosine_similarity(&query_vector, vector)?));
        }
        Ok(combine_scores(
            keyword_results,
            &semantic,
            keyword_weight.unwrap_or(self.config.keyword_weight),
            semantic_weight.unwrap_or(self.config.semantic_weight),
        ))
    }

    /// Keyword search over the store, fused with vector search when the
    /// embedding gateway can serve the query. Without it the response is
    /// keyword-only and says so.
    #[instrument(skip(self))]
    pub fn search(&self, query: &str, context: Option<&str>, limit: usize) -> SiftResult<SearchResponse> {
        let candidates = self.config.search_candidates.max(limit);
        let keyword: Vec<(String, f64)> = self
            .memories
            .search_text(query, context, candidates)?
            .into_iter()
            .map(|(memory, score)| (memory.id, score))
            .collect();

        let mut degradations = Vec::new();
        let semantic = match self.embed_query(query) {
            Ok(vector) => Some(
                self.memories
                    .search_vector(&vector, context, candidates)?
                    .into_iter()
                    .map(|(memory, similarity)| (memory.id, similarity))
                    .collect::<Vec<_>>(),
            ),
            Err(SiftError::EmbeddingError(EmbeddingError::DimensionMismatch { expected, actual })) => {
                return Err(EmbeddingError::DimensionMismatch { expected, actual }.into());
            }
            Err(e) => {
                warn!(error = %e, "query embedding unavailable, keyword-only search");
                degradations.push(Degradation::EmbeddingUnavailable { reason: e.to_string() });
                None
            }
        };

        let mut hits = match semantic {
            Some(semantic) => combine_scores(
                &keyword,
                &semantic,
                self.config.keyword_weight,
                self.config.semantic_weight,
            ),
            None => combine_scores(&keyword, &[], 1.0, 0.0),
        };
        hits.truncate(limit);
        debug!(keyword = keyword.len(), hits = hits.len(), "search finished");
        Ok(SearchResponse { hits, degradations })
    }

    /// RRF over ranked id lists, using the configured `k` unless one is given.
    pub fn reciprocal_rank_fusion(&self, lists: &[Vec<String>], k: Option<u32>) -> Vec<RankedHit> {
        reciprocal_rank_fusion(lists, k.unwrap_or(self.config.rrf_k))
    }

    #[instrument(skip(self))]
    pub fn search_by_entity(&self, name: &str) -> SiftResult<EntitySearchResult> {
        entity_search::search_by_entity(self.graph.as_ref(), name)
    }

    fn embed_query(&self, query: &str) -> SiftResult<Vec<f32>> {
        let Some(gateway) = self.gateway.as_ref().filter(|g| g.is_available()) else {
            return Err(EmbeddingError::ProviderUnavailable {
                provider: self
                    .gateway
                    .as_ref()
                    .map_or("none", |g| g.model_name())
                    .to_string(),
            }
            .into());
        };
        let vector = gateway.embed_query(query)?;
        ensure_dimensions(&vector, gateway.dimensions())?;
        Ok(vector)
    }
}
