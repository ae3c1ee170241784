//! Exact-duplicate grouping by normalized content hash.

use std::collections::HashMap;

use sift_core::models::{ExactDuplicateGroup, MemoryRecord};

/// Group memories sharing a content hash. Only groups of two or more are
/// returned, largest first, then by earliest member.
pub fn group_exact_duplicates(memories: &[MemoryRecord]) -> Vec<ExactDuplicateGroup> {
    let mut by_hash: HashMap<&str, Vec<&MemoryRecord>> = HashMap::new();
    for memory in memories {
        by_hash.entry(memory.content_hash.as_str()).or_default().push(memory);
    }

    let mut groups: Vec<ExactDuplicateGroup> = by_hash
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .filter_map(|(hash, mut members)| {
            members.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
            let first = members.first()?.created_at;
            let last = members.last()?.created_at;
            Some(ExactDuplicateGroup {
                content_hash: hash.to_string(),
                count: members.len(),
                memory_ids: members.iter().map(|m| m.id.clone()).collect(),
                first_created: first,
                last_created: last,
            })
        })
        .collect();

    groups.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.first_created.cmp(&b.first_created))
            .then_with(|| a.content_hash.cmp(&b.content_hash))
    });
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use sift_core::models::NewMemory;

    #[test]
    fn singletons_are_not_groups() {
        let now = Utc::now();
        let memories = vec![
            NewMemory::new("a").into_record(now),
            NewMemory::new("b").into_record(now),
        ];
        assert!(group_exact_duplicates(&memories).is_empty());
    }

    #[test]
    fn larger_groups_sort_first() {
        let now = Utc::now();
        let mut memories = Vec::new();
        for i in 0..2 {
            memories.push(NewMemory::new("pair").into_record(now - Duration::hours(10 - i)));
        }
        for i in 0..3 {
            memories.push(NewMemory::new("triple").into_record(now - Duration::hours(3 - i)));
        }
        let groups = group_exact_duplicates(&memories);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].count, 3);
        assert_eq!(groups[1].count, 2);
        assert_eq!(groups[1].span(), Duration::hours(1));
    }
}
