//! Exact case-insensitive name matches, regardless of entity type.

use std::collections::BTreeMap;

use sift_core::models::Entity;

use super::{DetectionMethod, DuplicatePair};

pub fn detect(entities: &[Entity]) -> Vec<DuplicatePair> {
    let mut by_name: BTreeMap<String, Vec<&Entity>> = BTreeMap::new();
    for entity in entities {
        by_name
            .entry(entity.name.trim().to_lowercase())
            .or_default()
            .push(entity);
    }

    let mut pairs = Vec::new();
    for group in by_name.values().filter(|g| g.len() > 1) {
        for (i, a) in group.iter().enumerate() {
            for b in &group[i + 1..] {
                pairs.push(DuplicatePair::oriented(a, b, 1.0, DetectionMethod::ExactName));
            }
        }
    }
    pairs
}
