//! Sliding embedding windows and multi-resolution chunk sets.

use serde::{Deserialize, Serialize};

use sift_tokens::TokenCounter;

use crate::chunker::{chunk_text, Chunk};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingWindow {
    pub index: usize,
    /// First token position covered (inclusive).
    pub start_token: usize,
    /// Last token position covered (exclusive).
    pub end_token: usize,
    pub text: String,
}

/// Fixed-stride windows over the token sequence. The last window is anchored
/// to the end of the sequence so the tail is covered once and never padded.
pub fn chunk_for_embedding(
    counter: &TokenCounter,
    text: &str,
    max_tokens: usize,
    stride: usize,
) -> Vec<EmbeddingWindow> {
    let segments = counter.segments(text);
    let n = segments.len();
    if n == 0 {
        return Vec::new();
    }
    let max_tokens = max_tokens.max(1);
    let stride = stride.clamp(1, max_tokens);

    let mut starts = Vec::new();
    let mut start = 0;
    while start + max_tokens < n {
        starts.push(start);
        start += stride;
    }
    let anchored = n.saturating_sub(max_tokens);
    if starts.last() != Some(&anchored) {
        starts.push(anchored);
    }

    starts
        .into_iter()
        .enumerate()
        .map(|(index, start)| {
            let end = (start + max_tokens).min(n);
            EmbeddingWindow {
                index,
                start_token: start,
                end_token: end,
                text: segments[start..end].concat(),
            }
        })
        .collect()
}

/// One granularity of a hierarchical chunking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkLevel {
    pub max_tokens: usize,
    pub chunks: Vec<Chunk>,
}

/// Independent chunkings at each level, with a tenth of the level as overlap.
pub fn create_hierarchical_chunks(
    counter: &TokenCounter,
    text: &str,
    levels: &[usize],
) -> Vec<ChunkLevel> {
    levels
        .iter()
        .map(|&max_tokens| ChunkLevel {
            max_tokens,
            chunks: chunk_text(counter, text, max_tokens, max_tokens / 10),
        })
        .collect()
}
