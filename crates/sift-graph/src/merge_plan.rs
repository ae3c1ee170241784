//! Survivor computation for an entity merge. Pure; the store applies the plan.

use chrono::{DateTime, Utc};

use sift_core::models::{Entity, MergeHistoryEntry, MergePlan, MergeStrategy};

/// Compute the surviving entity and audit record for merging `secondary`
/// into `primary`. The survivor keeps the primary's id; name and description
/// follow `strategy`; every name and alias of both sides that is not the final
/// name ends up in the alias list.
///
/// `Combine` concatenates the names in the description only. The survivor's
/// `name` stays the primary's so exact and alias lookups keep matching a
/// single real name; the secondary's name is recorded as an alias and in the
/// merge note.
pub fn build_merge_plan(
    primary: &Entity,
    secondary: &Entity,
    strategy: MergeStrategy,
    now: DateTime<Utc>,
) -> MergePlan {
    let mut survivor = primary.clone();
    survivor.updated_at = now;
    survivor.aliases.clear();

    match strategy {
        MergeStrategy::KeepPrimary => {}
        MergeStrategy::KeepSecondary => {
            survivor.name = secondary.name.clone();
            survivor.description = secondary.description.clone();
        }
        MergeStrategy::Combine => {
            survivor.description = combined_description(primary, secondary);
        }
    }

    let names = [&primary.name, &secondary.name]
        .into_iter()
        .chain(primary.aliases.iter())
        .chain(secondary.aliases.iter());
    for name in names {
        survivor.add_alias(name);
    }

    MergePlan {
        secondary_id: secondary.id.clone(),
        history: MergeHistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            primary_id: primary.id.clone(),
            secondary_id: secondary.id.clone(),
            strategy,
            merged_at: now,
            secondary_name: secondary.name.clone(),
            secondary_description: secondary.description.clone(),
        },
        survivor,
    }
}

/// Both descriptions (empty ones dropped, identical ones once) followed by a
/// note naming the absorbed entity.
fn combined_description(primary: &Entity, secondary: &Entity) -> String {
    let mut parts: Vec<String> = Vec::new();
    for text in [primary.description.trim(), secondary.description.trim()] {
        if !text.is_empty() && !parts.iter().any(|p| p == text) {
            parts.push(text.to_string());
        }
    }
    parts.push(format!(
        "Merged \"{}\" into \"{}\".",
        secondary.name, primary.name
    ));
    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(name: &str, description: &str, aliases: &[&str]) -> Entity {
        let mut e = Entity::new(name, "organization", Utc::now());
        e.description = description.to_string();
        for a in aliases {
            e.add_alias(a);
        }
        e
    }

    #[test]
    fn keep_primary_absorbs_names() {
        let p = entity("OpenAI", "AI lab", &[]);
        let s = entity("open ai", "", &["OAI"]);
        let plan = build_merge_plan(&p, &s, MergeStrategy::KeepPrimary, Utc::now());
        assert_eq!(plan.survivor.id, p.id);
        assert_eq!(plan.survivor.name, "OpenAI");
        assert_eq!(plan.survivor.description, "AI lab");
        assert_eq!(plan.survivor.aliases, vec!["open ai", "OAI"]);
        assert_eq!(plan.history.secondary_name, "open ai");
    }

    #[test]
    fn keep_secondary_takes_name_and_keeps_primary_id() {
        let p = entity("PG", "short", &[]);
        let s = entity("PostgreSQL", "database", &[]);
        let plan = build_merge_plan(&p, &s, MergeStrategy::KeepSecondary, Utc::now());
        assert_eq!(plan.survivor.id, p.id);
        assert_eq!(plan.survivor.name, "PostgreSQL");
        assert_eq!(plan.survivor.description, "database");
        assert_eq!(plan.survivor.aliases, vec!["PG"]);
    }

    #[test]
    fn combine_mentions_both_names() {
        let p = entity("OpenAI", "AI research company", &[]);
        let s = entity("open ai", "Maker of GPT models", &[]);
        let plan = build_merge_plan(&p, &s, MergeStrategy::Combine, Utc::now());
        let d = &plan.survivor.description;
        assert!(d.contains("AI research company"));
        assert!(d.contains("Maker of GPT models"));
        assert!(d.contains("OpenAI") && d.contains("open ai"));
        assert_eq!(plan.survivor.name, "OpenAI");
        assert_eq!(plan.survivor.aliases, vec!["open ai"]);
    }

    #[test]
    fn combine_with_empty_descriptions_still_names_both() {
        let p = entity("A", "", &[]);
        let s = entity("B", "", &[]);
        let plan = build_merge_plan(&p, &s, MergeStrategy::Combine, Utc::now());
        assert_eq!(plan.survivor.description, "Merged \"B\" into \"A\".");
    }
}
