use std::sync::Arc;

use moka::sync::Cache;
use tiktoken_rs::CoreBPE;
use tracing::warn;

use sift_core::constants::APPROX_CHARS_PER_TOKEN;

const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Which end of the text survives truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keep {
    Head,
    Tail,
}

/// Token counter with a content-hash cache.
#[derive(Clone)]
pub struct TokenCounter {
    bpe: Option<Arc<CoreBPE>>,
    cache: Cache<String, usize>,
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl TokenCounter {
    /// Load cl100k_base; fall back to estimation if the encoder is unavailable.
    pub fn new(cache_capacity: u64) -> Self {
        let bpe = match tiktoken_rs::cl100k_base() {
            Ok(bpe) => Some(Arc::new(bpe)),
            Err(e) => {
                warn!(error = %e, "tokenizer unavailable, falling back to character estimate");
                None
            }
        };
        Self {
            bpe,
            cache: Cache::new(cache_capacity),
        }
    }

    /// Character-estimate counter, never loads an encoder.
    pub fn approximate(cache_capacity: u64) -> Self {
        Self {
            bpe: None,
            cache: Cache::new(cache_capacity),
        }
    }

    /// Whether counts come from a real tokenizer.
    pub fn is_exact(&self) -> bool {
        self.bpe.is_some()
    }

    pub fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        match &self.bpe {
            Some(bpe) => bpe.encode_with_special_tokens(text).len(),
            None => estimate(text),
        }
    }

    /// Count with caching keyed by the blake3 hash of the text.
    pub fn count_cached(&self, text: &str) -> usize {
        let key = blake3::hash(text.as_bytes()).to_hex().to_string();
        if let Some(count) = self.cache.get(&key) {
            return count;
        }
        let count = self.count(text);
        self.cache.insert(key, count);
        count
    }

    /// Longest head or tail of `text` that fits in `max_tokens`.
    /// The result is always a contiguous slice of the input.
    pub fn truncate(&self, text: &str, max_tokens: usize, keep: Keep) -> String {
        if max_tokens == 0 || text.is_empty() {
            return String::new();
        }
        match &self.bpe {
            Some(bpe) => truncate_exact(bpe, text, max_tokens, keep),
            None => truncate_estimated(text, max_tokens, keep),
        }
    }

    /// Split `text` into contiguous slices that each hold one token, or the
    /// few tokens needed to complete a multi-byte character. Concatenating the
    /// slices yields `text`. Estimate mode slices every 4 characters.
    pub fn segments<'a>(&self, text: &'a str) -> Vec<&'a str> {
        if text.is_empty() {
            return Vec::new();
        }
        if let Some(bpe) = &self.bpe {
            if let Some(segments) = segments_exact(bpe, text) {
                return segments;
            }
        }
        segments_estimated(text)
    }

    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
    }
}

fn estimate(text: &str) -> usize {
    text.chars().count().div_ceil(APPROX_CHARS_PER_TOKEN)
}

fn truncate_estimated(text: &str, max_tokens: usize, keep: Keep) -> String {
    let max_chars = max_tokens.saturating_mul(APPROX_CHARS_PER_TOKEN);
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    match keep {
        Keep::Head => text.chars().take(max_chars).collect(),
        Keep::Tail => text.chars().skip(total - max_chars).collect(),
    }
}

fn segments_estimated(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for (n, (idx, _)) in text.char_indices().enumerate() {
        if n > 0 && n % APPROX_CHARS_PER_TOKEN == 0 {
            out.push(&text[start..idx]);
            start = idx;
        }
    }
    out.push(&text[start..]);
    out
}

fn segments_exact<'a>(bpe: &CoreBPE, text: &'a str) -> Option<Vec<&'a str>> {
    let tokens = bpe.encode_with_special_tokens(text);
    let mut out = Vec::with_capacity(tokens.len());
    let mut offset = 0;
    let mut pending = Vec::new();
    for token in tokens {
        pending.push(token);
        let Ok(decoded) = bpe.decode(pending.clone()) else {
            continue;
        };
        let end = offset + decoded.len();
        if text.get(offset..end) != Some(decoded.as_str()) {
            return None;
        }
        out.push(&text[offset..end]);
        offset = end;
        pending.clear();
    }
    (pending.is_empty() && offset == text.len()).then_some(out)
}

fn truncate_exact(bpe: &CoreBPE, text: &str, max_tokens: usize, keep: Keep) -> String {
    let tokens = bpe.encode_with_special_tokens(text);
    if tokens.len() <= max_tokens {
        return text.to_string();
    }

    // A token boundary can split a multi-byte character; give up one token at a
    // time until the slice decodes. Four steps cover any UTF-8 sequence.
    for shrink in 0..4usize {
        let take = max_tokens.saturating_sub(shrink);
        if take == 0 {
            break;
        }
        let slice = match keep {
            Keep::Head => tokens[..take].to_vec(),
            Keep::Tail => tokens[tokens.len() - take..].to_vec(),
        };
        if let Ok(decoded) = bpe.decode(slice) {
            let fits = match keep {
                Keep::Head => text.starts_with(&decoded),
                Keep::Tail => text.ends_with(&decoded),
            };
            if fits {
                return decoded;
            }
        }
    }
    truncate_estimated(text, max_tokens, keep)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_zero_tokens() {
        assert_eq!(TokenCounter::default().count(""), 0);
        assert_eq!(TokenCounter::approximate(16).count(""), 0);
    }

    #[test]
    fn estimate_rounds_up() {
        let counter = TokenCounter::approximate(16);
        assert!(!counter.is_exact());
        assert_eq!(counter.count("abcd"), 1);
        assert_eq!(counter.count("abcde"), 2);
    }

    #[test]
    fn exact_counter_counts_words() {
        let counter = TokenCounter::default();
        assert!(counter.is_exact());
        let n = counter.count("hello world");
        assert!((1..=3).contains(&n), "got {n}");
    }

    #[test]
    fn truncate_keeps_head_or_tail() {
        let counter = TokenCounter::default();
        let text = "one two three four five six seven eight nine ten";
        let head = counter.truncate(text, 3, Keep::Head);
        let tail = counter.truncate(text, 3, Keep::Tail);
        assert!(text.starts_with(&head) && !head.is_empty());
        assert!(text.ends_with(&tail) && !tail.is_empty());
        assert!(counter.count(&head) <= 3);
        assert!(counter.count(&tail) <= 3);
    }

    #[test]
    fn truncate_under_limit_is_identity() {
        let counter = TokenCounter::default();
        assert_eq!(counter.truncate("short", 100, Keep::Head), "short");
    }

    #[test]
    fn segments_concatenate_to_input() {
        let text = "Grüße aus Köln. 東京 is far away; naïve café.";
        for counter in [TokenCounter::default(), TokenCounter::approximate(16)] {
            let segments = counter.segments(text);
            assert!(!segments.is_empty());
            assert_eq!(segments.concat(), text);
        }
    }

    #[test]
    fn estimated_truncation_respects_char_boundaries() {
        let counter = TokenCounter::approximate(16);
        let text = "ééééééééééé";
        let out = counter.truncate(text, 1, Keep::Head);
        assert_eq!(out.chars().count(), 4);
        let out = counter.truncate(text, 1, Keep::Tail);
        assert_eq!(out, "éééé");
    }
}
