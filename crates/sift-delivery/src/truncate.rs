//! Token-limit truncation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use sift_tokens::{Keep, TokenCounter};

/// Whether token counts came from a tokenizer or the character estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    Exact,
    Approximate,
}

impl Precision {
    pub fn of(counter: &TokenCounter) -> Self {
        if counter.is_exact() {
            Self::Exact
        } else {
            Self::Approximate
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruncationResult {
    pub content: String,
    pub truncated: bool,
    pub original_tokens: usize,
    pub final_tokens: usize,
    pub limit: usize,
    pub precision: Precision,
}

/// Cut `content` to at most `limit` tokens, keeping the head or (with
/// `preserve_end`) the tail. Content already within the limit is returned unchanged.
pub fn truncate_to_tokens(
    counter: &TokenCounter,
    content: &str,
    limit: usize,
    preserve_end: bool,
) -> TruncationResult {
    let precision = Precision::of(counter);
    if precision == Precision::Approximate {
        debug!(limit, "truncating with estimated token counts (reduced precision)");
    }

    let original_tokens = counter.count_cached(content);
    if original_tokens <= limit {
        return TruncationResult {
            content: content.to_string(),
            truncated: false,
            original_tokens,
            final_tokens: original_tokens,
            limit,
            precision,
        };
    }

    let keep = if preserve_end { Keep::Tail } else { Keep::Head };
    let cut = counter.truncate(content, limit, keep);
    let final_tokens = counter.count(&cut);
    TruncationResult {
        content: cut,
        truncated: true,
        original_tokens,
        final_tokens,
        limit,
        precision,
    }
}
