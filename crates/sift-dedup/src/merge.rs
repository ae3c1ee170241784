//! Content and tag merging for `update_or_merge`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use sift_core::models::MemoryMergeStrategy;

/// What `update_or_merge` wrote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeResult {
    pub memory_id: String,
    /// Strategy that actually ran (`smart` can fall back to `append`).
    pub applied: MemoryMergeStrategy,
    pub content: String,
    pub tags: Vec<String>,
}

/// `existing`, a timestamped separator, then `incoming`.
pub fn append_with_separator(existing: &str, incoming: &str, at: DateTime<Utc>) -> String {
    format!(
        "{existing}\n\n--- Updated {} ---\n\n{incoming}",
        at.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

/// Existing tags followed by new ones not already present (case-insensitive).
pub fn union_tags(existing: &[String], incoming: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(existing.len() + incoming.len());
    for tag in existing.iter().chain(incoming) {
        if !out.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            out.push(tag.clone());
        }
    }
    out
}

pub(crate) fn smart_merge_prompt(existing: &str, incoming: &str) -> String {
    format!(
        "Merge the two notes below into a single note. Keep every fact from both, \
         prefer the newer note where they disagree, and do not add commentary.\n\n\
         EXISTING NOTE:\n{existing}\n\nNEW NOTE:\n{incoming}\n\nMERGED NOTE:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn append_uses_rfc3339_separator() {
        let at = Utc.with_ymd_and_hms(2026, 5, 4, 10, 30, 0).unwrap();
        assert_eq!(
            append_with_separator("old", "new", at),
            "old\n\n--- Updated 2026-05-04T10:30:00Z ---\n\nnew"
        );
    }

    #[test]
    fn tags_union_keeps_order_and_drops_case_duplicates() {
        let existing = vec!["rust".to_string(), "Auto-Capture".to_string()];
        let incoming = vec!["auto-capture".to_string(), "tokio".to_string()];
        assert_eq!(
            union_tags(&existing, &incoming),
            vec!["rust", "Auto-Capture", "tokio"]
        );
    }
}
