//! Reciprocal Rank Fusion: score = Σ 1/(k + rank), rank 1-based.
//!
//! Fuses ranked lists without comparing their raw scores.

use std::collections::HashMap;

use sift_core::models::RankedHit;

/// Fuse ranked lists of memory ids. Output is sorted by fused score; equal
/// scores keep the order in which the ids were first seen.
pub fn reciprocal_rank_fusion(lists: &[Vec<String>], k: u32) -> Vec<RankedHit> {
    let mut scores: HashMap<&str, (f64, usize)> = HashMap::new();
    let mut seen = 0usize;

    for list in lists {
        for (position, id) in list.iter().enumerate() {
            let rank = position + 1;
            let contribution = 1.0 / (k as f64 + rank as f64);
            let entry = scores.entry(id.as_str()).or_insert_with(|| {
                seen += 1;
                (0.0, seen)
            });
            entry.0 += contribution;
        }
    }

    let mut fused: Vec<(&str, f64, usize)> = scores
        .into_iter()
        .map(|(id, (score, first))| (id, score, first))
        .collect();
    fused.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.2.cmp(&b.2)));

    fused
        .into_iter()
        .map(|(id, score, _)| RankedHit {
            memory_id: id.to_string(),
            score,
            keyword_score: None,
            semantic_score: None,
        })
        .collect()
}
