//! Alias grouping delegated to the text generator.
//!
//! For each entity type the generator sees the list of names and answers with
//! a JSON array of equivalence classes, e.g. `[["OpenAI", "open ai"]]`. Every
//! pair inside a class becomes a candidate at a fixed confidence. A failed or
//! unparsable answer drops that batch only.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use sift_core::models::Entity;
use sift_core::traits::ITextGenerator;

use super::{DetectionMethod, DuplicatePair};

pub fn detect(
    generator: &dyn ITextGenerator,
    entities: &[Entity],
    confidence: f64,
    batch_size: usize,
) -> Vec<DuplicatePair> {
    let mut by_type: BTreeMap<String, Vec<&Entity>> = BTreeMap::new();
    for entity in entities {
        by_type
            .entry(entity.entity_type.to_lowercase())
            .or_default()
            .push(entity);
    }

    let mut pairs = Vec::new();
    for (entity_type, group) in &by_type {
        if group.len() < 2 {
            continue;
        }
        for batch in group.chunks(batch_size.max(2)) {
            let names: Vec<&str> = batch.iter().map(|e| e.name.as_str()).collect();
            let response = match generator.generate(&grouping_prompt(entity_type, &names)) {
                Ok(text) => text,
                Err(e) => {
                    warn!(entity_type = %entity_type, error = %e, "alias grouping request failed");
                    continue;
                }
            };
            let Some(groups) = parse_groups(&response) else {
                warn!(entity_type = %entity_type, "alias grouping response was not a JSON list of groups");
                continue;
            };
            let found = pairs_from_groups(batch, &groups, confidence);
            debug!(entity_type = %entity_type, groups = groups.len(), pairs = found.len(), "alias grouping");
            pairs.extend(found);
        }
    }
    pairs
}

pub(crate) fn grouping_prompt(entity_type: &str, names: &[&str]) -> String {
    let listed = names
        .iter()
        .map(|n| format!("- {n}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "The following names all refer to entities of type \"{entity_type}\".\n\
         Group the names that refer to the same real-world entity.\n\
         Answer with a JSON array of arrays of names, using the names exactly as written.\n\
         Leave out names that have no alias in the list.\n\n{listed}"
    )
}

/// Extract the outermost JSON array of string arrays from a free-form answer.
pub(crate) fn parse_groups(response: &str) -> Option<Vec<Vec<String>>> {
    let start = response.find('[')?;
    let end = response.rfind(']')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&response[start..=end]).ok()
}

fn pairs_from_groups(batch: &[&Entity], groups: &[Vec<String>], confidence: f64) -> Vec<DuplicatePair> {
    let mut pairs = Vec::new();
    for group in groups {
        let members: Vec<&Entity> = batch
            .iter()
            .copied()
            .filter(|e| group.iter().any(|name| name.trim().eq_ignore_ascii_case(e.name.trim())))
            .collect();
        for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                pairs.push(DuplicatePair::oriented(a, b, confidence, DetectionMethod::AiAlias));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_groups_wrapped_in_prose() {
        let text = "Sure! Here you go:\n```json\n[[\"K8s\", \"Kubernetes\"], [\"JS\", \"JavaScript\"]]\n```";
        let groups = parse_groups(text).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], vec!["K8s", "Kubernetes"]);
    }

    #[test]
    fn rejects_non_group_json() {
        assert!(parse_groups("no json here").is_none());
        assert!(parse_groups("[1, 2, 3]").is_none());
        assert!(parse_groups("] backwards [").is_none());
    }

    #[test]
    fn prompt_lists_every_name() {
        let prompt = grouping_prompt("technology", &["K8s", "Kubernetes"]);
        assert!(prompt.contains("- K8s\n- Kubernetes"));
        assert!(prompt.contains("\"technology\""));
    }
}
