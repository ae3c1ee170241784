//! Property tests for fuzzy name similarity.

use proptest::prelude::*;
use sift_graph::detection::fuzzy::{levenshtein, name_similarity};

proptest! {
    #[test]
    fn similarity_is_symmetric_and_bounded(a in "[a-zA-Z ]{0,16}", b in "[a-zA-Z ]{0,16}") {
        let ab = name_similarity(&a, &b);
        let ba = name_similarity(&b, &a);
        prop_assert!((ab - ba).abs() < 1e-12);
        prop_assert!((0.0..=1.0).contains(&ab));
    }

    #[test]
    fn identical_ignoring_case_scores_one(a in "[a-zA-Z]{1,16}") {
        prop_assert_eq!(name_similarity(&a, &a.to_uppercase()), 1.0);
    }

    #[test]
    fn distance_obeys_triangle_inequality(
        a in "[abc]{0,8}",
        b in "[abc]{0,8}",
        c in "[abc]{0,8}",
    ) {
        prop_assert!(levenshtein(&a, &c) <= levenshtein(&a, &b) + levenshtein(&b, &c));
    }
}
