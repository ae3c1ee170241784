//! Duplicate-entity detectors and the rules for combining their output.

pub mod ai_grouping;
pub mod exact;
pub mod fuzzy;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use sift_core::models::Entity;

/// Which detector proposed a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    ExactName,
    FuzzyName,
    AiAlias,
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ExactName => "exact_name",
            Self::FuzzyName => "fuzzy_name",
            Self::AiAlias => "ai_alias",
        })
    }
}

/// Two entities believed to name the same thing. `primary` is the older one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicatePair {
    pub primary_id: String,
    pub primary_name: String,
    pub secondary_id: String,
    pub secondary_name: String,
    pub confidence: f64,
    pub method: DetectionMethod,
}

impl DuplicatePair {
    /// Build a pair, ordering the two entities oldest first (id breaks ties).
    pub fn oriented(a: &Entity, b: &Entity, confidence: f64, method: DetectionMethod) -> Self {
        let (primary, secondary) = if (a.created_at, &a.id) <= (b.created_at, &b.id) {
            (a, b)
        } else {
            (b, a)
        };
        Self {
            primary_id: primary.id.clone(),
            primary_name: primary.name.clone(),
            secondary_id: secondary.id.clone(),
            secondary_name: secondary.name.clone(),
            confidence,
            method,
        }
    }

    /// Human-readable justification shown in manual review.
    pub fn reason(&self) -> String {
        match self.method {
            DetectionMethod::ExactName => "names match ignoring case".to_string(),
            DetectionMethod::FuzzyName => format!("name similarity {:.2}", self.confidence),
            DetectionMethod::AiAlias => "grouped as aliases by the text generator".to_string(),
        }
    }

    fn key(&self) -> (String, String) {
        (self.primary_id.clone(), self.secondary_id.clone())
    }
}

/// Merge detector outputs: one entry per unordered pair. Detector batches are
/// given in priority order; a later batch only replaces an earlier entry with a
/// strictly higher confidence. Result is sorted by confidence, highest first.
pub fn union_pairs(batches: Vec<Vec<DuplicatePair>>) -> Vec<DuplicatePair> {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut best: HashMap<(String, String), DuplicatePair> = HashMap::new();

    for pair in batches.into_iter().flatten() {
        let key = pair.key();
        match best.get_mut(&key) {
            Some(existing) => {
                if pair.confidence > existing.confidence {
                    *existing = pair;
                }
            }
            None => {
                order.push(key.clone());
                best.insert(key, pair);
            }
        }
    }

    let mut pairs: Vec<DuplicatePair> = order
        .into_iter()
        .filter_map(|key| best.remove(&key))
        .collect();
    // Stable sort keeps first-seen order among equal confidences.
    pairs.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn entity(name: &str, age_secs: i64) -> Entity {
        Entity::new(name, "thing", Utc::now() - Duration::seconds(age_secs))
    }

    #[test]
    fn older_entity_is_primary() {
        let old = entity("Old", 100);
        let new = entity("New", 10);
        let pair = DuplicatePair::oriented(&new, &old, 0.9, DetectionMethod::FuzzyName);
        assert_eq!(pair.primary_id, old.id);
        assert_eq!(pair.secondary_id, new.id);
    }

    #[test]
    fn union_keeps_first_unless_strictly_better() {
        let a = entity("A", 100);
        let b = entity("B", 50);
        let c = entity("C", 10);
        let exact = vec![DuplicatePair::oriented(&a, &b, 1.0, DetectionMethod::ExactName)];
        let fuzzy = vec![
            DuplicatePair::oriented(&b, &a, 1.0, DetectionMethod::FuzzyName),
            DuplicatePair::oriented(&a, &c, 0.86, DetectionMethod::FuzzyName),
        ];
        let ai = vec![DuplicatePair::oriented(&a, &c, 0.8, DetectionMethod::AiAlias)];

        let merged = union_pairs(vec![exact, fuzzy, ai]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].method, DetectionMethod::ExactName);
        assert_eq!(merged[1].method, DetectionMethod::FuzzyName);
        assert!((merged[1].confidence - 0.86).abs() < 1e-9);
    }
}
