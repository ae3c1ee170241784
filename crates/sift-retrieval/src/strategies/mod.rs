//! Independent recommendation signals for a source memory.
//!
//! Each strategy returns hits sorted by score (memory id breaks ties) and
//! never includes the source itself.

pub mod content;
pub mod entity;
pub mod relation;
pub mod temporal;

use sift_core::models::StrategyHit;

pub(crate) fn sort_hits(hits: &mut [StrategyHit]) {
    hits.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.memory_id.cmp(&b.memory_id))
    });
}
