//! Keyword + semantic score combination.

use std::collections::HashMap;

use sift_core::models::RankedHit;

/// Combine keyword scores (any positive scale) with semantic similarities.
///
/// Keyword scores are divided by their maximum; semantic scores are used as
/// given. A memory missing from one side contributes 0 for it. The result
/// covers the union of both id sets, sorted by combined score; ties keep
/// first-seen order (keyword list first).
pub fn combine_scores(
    keyword: &[(String, f64)],
    semantic: &[(String, f64)],
    keyword_weight: f64,
    semantic_weight: f64,
) -> Vec<RankedHit> {
    let max_keyword = keyword.iter().map(|(_, s)| *s).fold(0.0f64, f64::max);

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut hits: Vec<RankedHit> = Vec::new();

    for (id, score) in keyword {
        let normalized = if max_keyword > 0.0 { score / max_keyword } else { 0.0 };
        let slot = slot_for(&mut index, &mut hits, id);
        let hit = &mut hits[slot];
        hit.keyword_score = Some(hit.keyword_score.map_or(normalized, |s| s.max(normalized)));
    }
    for (id, similarity) in semantic {
        let slot = slot_for(&mut index, &mut hits, id);
        let hit = &mut hits[slot];
        hit.semantic_score = Some(hit.semantic_score.map_or(*similarity, |s| s.max(*similarity)));
    }

    for hit in &mut hits {
        hit.score = keyword_weight * hit.keyword_score.unwrap_or(0.0)
            + semantic_weight * hit.semantic_score.unwrap_or(0.0);
    }
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits
}

fn slot_for<'a>(index: &mut HashMap<&'a str, usize>, hits: &mut Vec<RankedHit>, id: &'a str) -> usize {
    *index.entry(id).or_insert_with(|| {
        hits.push(RankedHit {
            memory_id: id.to_string(),
            score: 0.0,
            keyword_score: None,
            semantic_score: None,
        });
        hits.len() - 1
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(items: &[(&str, f64)]) -> Vec<(String, f64)> {
        items.iter().map(|(id, s)| (id.to_string(), *s)).collect()
    }

    #[test]
    fn keyword_scores_are_normalized_by_max() {
        let hits = combine_scores(&scored(&[("a", 8.0), ("b", 2.0)]), &[], 0.4, 0.6);
        assert!((hits[0].score - 0.4).abs() < 1e-9);
        assert!((hits[1].score - 0.1).abs() < 1e-9);
        assert_eq!(hits[1].keyword_score, Some(0.25));
        assert_eq!(hits[1].semantic_score, None);
    }

    #[test]
    fn union_of_both_sides() {
        let hits = combine_scores(
            &scored(&[("kw_only", 1.0), ("both", 0.5)]),
            &scored(&[("both", 0.9), ("sem_only", 0.8)]),
            0.4,
            0.6,
        );
        let order: Vec<&str> = hits.iter().map(|h| h.memory_id.as_str()).collect();
        // both: 0.4*0.5 + 0.6*0.9 = 0.74; sem_only: 0.48; kw_only: 0.4
        assert_eq!(order, vec!["both", "sem_only", "kw_only"]);
    }
}
