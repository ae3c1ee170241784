//! Per-entity event history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sift_core::models::{Entity, MergeStrategy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimelineEventKind {
    Created,
    Mentioned {
        memory_id: String,
        relevance: f64,
    },
    /// Another entity was merged into this one.
    Absorbed {
        secondary_id: String,
        secondary_name: String,
        strategy: MergeStrategy,
    },
    /// This entity was merged into another one.
    MergedInto {
        primary_id: String,
        strategy: MergeStrategy,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: TimelineEventKind,
}

/// Events touching one entity, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityTimeline {
    /// Id the caller asked for.
    pub query_id: String,
    pub found: bool,
    /// Current entity, after following forwarding entries.
    pub entity: Option<Entity>,
    pub events: Vec<TimelineEvent>,
}

impl EntityTimeline {
    pub fn not_found(query_id: &str) -> Self {
        Self {
            query_id: query_id.to_string(),
            found: false,
            entity: None,
            events: Vec::new(),
        }
    }
}

/// Newest first. The sort is stable so simultaneous events keep insertion order.
pub(crate) fn sort_newest_first(events: &mut [TimelineEvent]) {
    events.sort_by(|a, b| b.at.cmp(&a.at));
}
