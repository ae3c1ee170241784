use proptest::prelude::*;

use sift_delivery::chunker::chunk_text;
use sift_delivery::truncate::truncate_to_tokens;
use sift_tokens::TokenCounter;

fn prose() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            "[a-zA-Z]{1,12}",
            Just(" ".to_string()),
            Just(", ".to_string()),
            Just(". ".to_string()),
            Just("\n".to_string()),
            Just("\n\n".to_string()),
            Just("\n\n\n".to_string()),
            Just("é".to_string()),
        ],
        0..200,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn stripped_chunks_concatenate_to_input(text in prose(), max in 1usize..64, overlap in 0usize..8) {
        let counter = TokenCounter::default();
        let chunks = chunk_text(&counter, &text, max, overlap);
        let rejoined: String = chunks.iter().map(|c| c.body()).collect();
        prop_assert_eq!(rejoined, text);
    }

    #[test]
    fn chunk_bodies_fit_budget(text in prose(), max in 4usize..64) {
        let counter = TokenCounter::default();
        for chunk in chunk_text(&counter, &text, max, 0) {
            prop_assert!(counter.count(chunk.body()) <= max);
        }
    }

    #[test]
    fn truncation_is_noop_within_limit(text in ".{0,200}") {
        let counter = TokenCounter::default();
        let limit = counter.count(&text);
        let result = truncate_to_tokens(&counter, &text, limit, false);
        prop_assert!(!result.truncated);
        prop_assert_eq!(result.content, text);
    }
}
