//! Fuzzy name similarity between entities of the same type.

use std::collections::BTreeMap;

use sift_core::models::Entity;

use super::{DetectionMethod, DuplicatePair};

/// Edit distance over chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    // Two-row DP.
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// `1 - distance / max_len` on lower-cased, trimmed names. Two empty names score 1.0.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / max_len as f64
}

/// Same-typed pairs whose name similarity is strictly above `threshold`.
pub fn detect(entities: &[Entity], threshold: f64) -> Vec<DuplicatePair> {
    let mut by_type: BTreeMap<String, Vec<&Entity>> = BTreeMap::new();
    for entity in entities {
        by_type
            .entry(entity.entity_type.to_lowercase())
            .or_default()
            .push(entity);
    }

    let mut pairs = Vec::new();
    for group in by_type.values() {
        for (i, a) in group.iter().enumerate() {
            for b in &group[i + 1..] {
                let similarity = name_similarity(&a.name, &b.name);
                if similarity > threshold {
                    pairs.push(DuplicatePair::oriented(a, b, similarity, DetectionMethod::FuzzyName));
                }
            }
        }
    }
    pairs
}
