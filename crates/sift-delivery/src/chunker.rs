//! Delimiter-hierarchy chunking.
//!
//! Each level splits with its delimiters kept attached to the preceding
//! piece, so the bodies of the produced chunks concatenate to the input
//! byte for byte. Overlap prefixes are carried separately and stripped by
//! [`Chunk::body`].

use serde::{Deserialize, Serialize};

use sift_core::constants::CHUNK_OVERLAP_MARKER;
use sift_tokens::{Keep, TokenCounter};

/// Coarsest first: multi-blank-line, paragraph, line, sentence, clause, word.
const DELIMITER_LEVELS: &[&[&str]] = &[
    &["\n\n\n"],
    &["\n\n"],
    &["\n"],
    &[". ", "! ", "? ", ".\n", "!\n", "?\n"],
    &["; ", ", ", ": "],
    &[" ", "\t"],
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub total: usize,
    pub has_more: bool,
    /// Overlap prefix (with marker) followed by the chunk body.
    pub content: String,
    /// Byte length of the overlap prefix including the marker; 0 for the first chunk.
    pub overlap_len: usize,
}

impl Chunk {
    /// The chunk without its overlap prefix.
    pub fn body(&self) -> &str {
        &self.content[self.overlap_len..]
    }

    pub fn overlap(&self) -> &str {
        &self.content[..self.overlap_len]
    }
}

/// Split `text` into chunks whose bodies hold at most `max_tokens` tokens.
/// Chunks after the first start with the last `overlap_tokens` tokens of the
/// previous body and the overlap marker.
pub fn chunk_text(
    counter: &TokenCounter,
    text: &str,
    max_tokens: usize,
    overlap_tokens: usize,
) -> Vec<Chunk> {
    if text.is_empty() {
        return Vec::new();
    }
    let max_tokens = max_tokens.max(1);
    let bodies = pack(counter, text, max_tokens, 0);
    let total = bodies.len();

    let mut chunks = Vec::with_capacity(total);
    let mut previous: Option<&str> = None;
    for (index, body) in bodies.iter().enumerate() {
        let prefix = match previous {
            Some(prev) if overlap_tokens > 0 => {
                let tail = counter.truncate(prev, overlap_tokens, Keep::Tail);
                format!("{tail}{CHUNK_OVERLAP_MARKER}")
            }
            _ => String::new(),
        };
        chunks.push(Chunk {
            index,
            total,
            has_more: index + 1 < total,
            overlap_len: prefix.len(),
            content: prefix + body,
        });
        previous = Some(body);
    }
    chunks
}

/// Greedy packing at the coarsest delimiter level that has at least one
/// piece within budget. Oversized pieces descend to finer levels. Each piece
/// is counted once and a chunk's budget is the running sum of its pieces.
fn pack<'a>(counter: &TokenCounter, text: &'a str, max_tokens: usize, level: usize) -> Vec<&'a str> {
    if counter.count_cached(text) <= max_tokens {
        return vec![text];
    }

    for lvl in level..DELIMITER_LEVELS.len() {
        let pieces = split_keep(text, DELIMITER_LEVELS[lvl]);
        let costs: Vec<usize> = pieces.iter().map(|p| counter.count_cached(p)).collect();
        if pieces.len() < 2 || !costs.iter().any(|&c| c <= max_tokens) {
            continue;
        }

        let mut out = Vec::new();
        let mut start = 0usize;
        let mut end = 0usize;
        let mut used = 0usize;
        for (piece, cost) in pieces.into_iter().zip(costs) {
            if cost > max_tokens {
                push_packed(counter, &mut out, &text[start..end], max_tokens, lvl + 1);
                out.extend(pack(counter, piece, max_tokens, lvl + 1));
                end += piece.len();
                start = end;
                used = 0;
                continue;
            }
            if used + cost > max_tokens {
                push_packed(counter, &mut out, &text[start..end], max_tokens, lvl + 1);
                start = end;
                used = 0;
            }
            end += piece.len();
            used += cost;
        }
        push_packed(counter, &mut out, &text[start..end], max_tokens, lvl + 1);
        return out;
    }

    hard_split(counter, text, max_tokens)
}

/// Emit a packed run. Piece counts do not always add up to the count of the
/// joined run, so a run that overshoots is split again one level finer.
fn push_packed<'a>(
    counter: &TokenCounter,
    out: &mut Vec<&'a str>,
    run: &'a str,
    max_tokens: usize,
    next_level: usize,
) {
    if run.is_empty() {
        return;
    }
    if counter.count_cached(run) <= max_tokens {
        out.push(run);
    } else {
        out.extend(pack(counter, run, max_tokens, next_level));
    }
}

/// Cut by token count when no delimiter produces a piece that fits. The text
/// is segmented once and segments are grouped by their running token count.
fn hard_split<'a>(counter: &TokenCounter, text: &'a str, max_tokens: usize) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut end = 0usize;
    let mut used = 0usize;
    for segment in counter.segments(text) {
        let cost = counter.count(segment).max(1);
        if used + cost > max_tokens && end > start {
            push_fitting(counter, &mut out, &text[start..end], max_tokens);
            start = end;
            used = 0;
        }
        end += segment.len();
        used += cost;
    }
    push_fitting(counter, &mut out, &text[start..end], max_tokens);
    out
}

/// Re-encoding a run of segments can occasionally cost an extra token; halve
/// such runs until they fit. A single character is emitted as is.
fn push_fitting<'a>(counter: &TokenCounter, out: &mut Vec<&'a str>, run: &'a str, max_tokens: usize) {
    if run.is_empty() {
        return;
    }
    let mid = run
        .char_indices()
        .map(|(idx, _)| idx)
        .find(|&idx| idx >= run.len() / 2 && idx > 0);
    match mid {
        Some(mid) if counter.count(run) > max_tokens => {
            push_fitting(counter, out, &run[..mid], max_tokens);
            push_fitting(counter, out, &run[mid..], max_tokens);
        }
        _ => out.push(run),
    }
}

/// Split after every occurrence of any delimiter, keeping it on the left piece.
fn split_keep<'a>(text: &'a str, delimiters: &[&str]) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        if let Some(d) = delimiters.iter().find(|d| rest.starts_with(**d)) {
            i += d.len();
            pieces.push(&text[start..i]);
            start = i;
            continue;
        }
        i += rest.chars().next().map(char::len_utf8).unwrap_or(1);
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejoin(chunks: &[Chunk]) -> String {
        chunks.iter().map(Chunk::body).collect()
    }

    #[test]
    fn split_keep_is_lossless() {
        let text = "a. b! c? d";
        let pieces = split_keep(text, DELIMITER_LEVELS[3]);
        assert_eq!(pieces, vec!["a. ", "b! ", "c? ", "d"]);
        assert_eq!(pieces.concat(), text);
    }

    #[test]
    fn short_text_is_one_chunk() {
        let counter = TokenCounter::default();
        let chunks = chunk_text(&counter, "hello there", 100, 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].total, 1);
        assert!(!chunks[0].has_more);
        assert_eq!(chunks[0].overlap_len, 0);
    }

    #[test]
    fn paragraphs_are_preferred_over_sentences() {
        let counter = TokenCounter::default();
        let para = "The cat sat. The dog ran. The bird flew.";
        let text = format!("{para}\n\n{para}\n\n{para}");
        let limit = counter.count(&format!("{para}\n\n")) + 1;
        let chunks = chunk_text(&counter, &text, limit, 0);
        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].body().ends_with("\n\n"));
        assert_eq!(rejoin(&chunks), text);
    }

    #[test]
    fn overlap_prefix_carries_marker_and_previous_tail() {
        let counter = TokenCounter::default();
        let text = "alpha beta gamma delta. epsilon zeta eta theta. iota kappa lambda mu.";
        let chunks = chunk_text(&counter, text, 8, 2);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let overlap = pair[1].overlap();
            assert!(overlap.ends_with(CHUNK_OVERLAP_MARKER));
            let carried = &overlap[..overlap.len() - CHUNK_OVERLAP_MARKER.len()];
            assert!(pair[0].body().ends_with(carried));
        }
        assert_eq!(rejoin(&chunks), text);
        assert!(chunks.iter().all(|c| c.total == chunks.len()));
        assert!(chunks.last().is_some_and(|c| !c.has_more));
    }

    #[test]
    fn large_input_packs_in_budget() {
        let counter = TokenCounter::default();
        let sentence = "Packing counts every sentence once and keeps a running sum. ";
        let text = sentence.repeat(5_000);
        let chunks = chunk_text(&counter, &text, 64, 0);
        assert!(chunks.len() > 100);
        assert!(chunks.iter().all(|c| counter.count(c.body()) <= 64));
        assert_eq!(rejoin(&chunks), text);
    }

    #[test]
    fn unbroken_text_is_hard_split() {
        let counter = TokenCounter::default();
        let text = "x".repeat(2_000);
        let chunks = chunk_text(&counter, &text, 16, 0);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| counter.count(c.body()) <= 16));
        assert_eq!(rejoin(&chunks), text);
    }

    #[test]
    fn hard_split_in_estimate_mode() {
        let counter = TokenCounter::approximate(16);
        let text = "é".repeat(1_001);
        let pieces = hard_split(&counter, &text, 10);
        assert_eq!(pieces.len(), 26);
        assert!(pieces.iter().all(|p| counter.count(p) <= 10));
        assert_eq!(pieces.concat(), text);
    }
}
