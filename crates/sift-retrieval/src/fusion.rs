//! Weighted fusion of strategy outputs.

use std::collections::HashMap;

use sift_core::config::StrategyWeights;
use sift_core::models::{FusedRecommendation, StrategyHit, StrategyKind};

pub fn weight_of(weights: &StrategyWeights, kind: StrategyKind) -> f64 {
    match kind {
        StrategyKind::Entity => weights.entity,
        StrategyKind::Relation => weights.relation,
        StrategyKind::Content => weights.content,
        StrategyKind::Temporal => weights.temporal,
    }
}

/// Combine per-strategy hits into one ranking.
///
/// Each memory's raw score is Σ score × weight over the strategies that
/// returned it; scores are then divided by the largest raw score. Ties keep
/// the order in which memories were first produced, walking the strategies in
/// [`StrategyKind::ALL`] order. At most `limit` results are returned.
pub fn fuse_strategies(
    results: &[(StrategyKind, Vec<StrategyHit>)],
    weights: &StrategyWeights,
    limit: usize,
) -> Vec<FusedRecommendation> {
    let mut ordered: Vec<&(StrategyKind, Vec<StrategyHit>)> = results.iter().collect();
    ordered.sort_by_key(|(kind, _)| *kind);

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut fused: Vec<FusedRecommendation> = Vec::new();

    for (kind, hits) in ordered {
        let weight = weight_of(weights, *kind);
        for hit in hits {
            let slot = *index.entry(hit.memory_id.as_str()).or_insert_with(|| {
                fused.push(FusedRecommendation {
                    memory_id: hit.memory_id.clone(),
                    score: 0.0,
                    raw_score: 0.0,
                    strategies: Vec::new(),
                    reasons: Vec::new(),
                });
                fused.len() - 1
            });
            let entry = &mut fused[slot];
            entry.raw_score += hit.score * weight;
            if !entry.strategies.contains(kind) {
                entry.strategies.push(*kind);
            }
            if !hit.reason.is_empty() {
                entry.reasons.push(hit.reason.clone());
            }
        }
    }

    let max = fused.iter().map(|f| f.raw_score).fold(0.0f64, f64::max);
    for entry in &mut fused {
        entry.score = if max > 0.0 { entry.raw_score / max } else { 0.0 };
    }

    // Stable: first-seen order survives among equal scores.
    fused.sort_by(|a, b| b.raw_score.total_cmp(&a.raw_score));
    fused.truncate(limit);
    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, score: f64, reason: &str) -> StrategyHit {
        StrategyHit::new(id, score, reason)
    }

    #[test]
    fn weights_and_normalization() {
        let results = vec![
            (StrategyKind::Entity, vec![hit("a", 1.0, "shares 1 entity")]),
            (StrategyKind::Temporal, vec![hit("a", 0.5, "same day"), hit("b", 1.0, "same hour")]),
        ];
        let fused = fuse_strategies(&results, &StrategyWeights::default(), 10);
        assert_eq!(fused[0].memory_id, "a");
        assert!((fused[0].raw_score - 1.3).abs() < 1e-9);
        assert!((fused[0].score - 1.0).abs() < 1e-9);
        assert!((fused[1].score - 0.6 / 1.3).abs() < 1e-9);
        assert_eq!(fused[0].reason(), "shares 1 entity; same day");
        assert_eq!(fused[0].strategies, vec![StrategyKind::Entity, StrategyKind::Temporal]);
    }

    #[test]
    fn ties_follow_strategy_order_not_input_order() {
        let weights = StrategyWeights {
            entity: 1.0,
            content: 1.0,
            relation: 1.0,
            temporal: 1.0,
        };
        let results = vec![
            (StrategyKind::Temporal, vec![hit("t", 0.5, "")]),
            (StrategyKind::Content, vec![hit("c", 0.5, "")]),
            (StrategyKind::Relation, vec![hit("r", 0.5, "")]),
            (StrategyKind::Entity, vec![hit("e", 0.5, "")]),
        ];
        let fused = fuse_strategies(&results, &weights, 10);
        let order: Vec<&str> = fused.iter().map(|f| f.memory_id.as_str()).collect();
        assert_eq!(order, vec!["e", "r", "c", "t"]);
    }

    #[test]
    fn limit_truncates() {
        let results = vec![(
            StrategyKind::Content,
            (0..10).map(|i| hit(&format!("m{i}"), 1.0 - i as f64 / 10.0, "")).collect(),
        )];
        assert_eq!(fuse_strategies(&results, &StrategyWeights::default(), 3).len(), 3);
        assert!(fuse_strategies(&[], &StrategyWeights::default(), 3).is_empty());
    }
}
