//! # sift-dedup
//!
//! Keeps near-identical memories from piling up.
//!
//! - `check_duplicate`: embedding similarity against recent memories of the same context
//! - `create_with_dedup`: write, auto-merge, or hand the decision back to the caller
//! - `update_or_merge`: append / replace / smart merge into an existing memory
//! - `find_exact_duplicates`: normalized-hash sweep that catches what the fast path misses

mod engine;
mod exact;
mod merge;

pub use engine::{DeduplicationEngine, DuplicateCheck};
pub use exact::group_exact_duplicates;
pub use merge::{append_with_separator, union_tags, MergeResult};
