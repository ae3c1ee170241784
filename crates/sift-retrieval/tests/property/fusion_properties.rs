//! Property tests for rank and score fusion.

use std::collections::HashMap;

use proptest::prelude::*;
use sift_core::config::StrategyWeights;
use sift_core::models::{StrategyHit, StrategyKind};
use sift_retrieval::{fuse_strategies, reciprocal_rank_fusion};

fn ranked_lists() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(
        prop::collection::hash_set("[a-h]", 0..6).prop_map(|s| s.into_iter().collect::<Vec<_>>()),
        1..5,
    )
}

fn score_map(lists: &[Vec<String>]) -> HashMap<String, f64> {
    reciprocal_rank_fusion(lists, 60)
        .into_iter()
        .map(|h| (h.memory_id, h.score))
        .collect()
}

proptest! {
    #[test]
    fn rrf_scores_ignore_list_order(lists in ranked_lists()) {
        let forward = score_map(&lists);
        let mut reversed = lists.clone();
        reversed.reverse();
        let backward = score_map(&reversed);
        prop_assert_eq!(forward.len(), backward.len());
        for (id, score) in &forward {
            prop_assert!((score - backward[id]).abs() < 1e-12);
        }
    }

    #[test]
    fn rrf_output_is_sorted(lists in ranked_lists()) {
        let fused = reciprocal_rank_fusion(&lists, 60);
        for pair in fused.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn fused_scores_are_normalized(
        scores in prop::collection::vec((0usize..4, "[a-f]", 0.01f64..1.0), 1..20),
    ) {
        let mut by_kind: Vec<(StrategyKind, Vec<StrategyHit>)> =
            StrategyKind::ALL.iter().map(|k| (*k, Vec::new())).collect();
        for (kind, id, score) in scores {
            by_kind[kind].1.push(StrategyHit::new(id, score, ""));
        }
        let fused = fuse_strategies(&by_kind, &StrategyWeights::default(), usize::MAX);
        prop_assert!((fused[0].score - 1.0).abs() < 1e-9);
        for rec in &fused {
            prop_assert!(rec.score > 0.0 && rec.score <= 1.0 + 1e-12);
        }
    }
}
