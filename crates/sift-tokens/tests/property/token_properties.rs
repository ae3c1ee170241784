use proptest::prelude::*;
use sift_tokens::{Keep, TokenCounter};

proptest! {
    #[test]
    fn cached_equals_uncached(s in ".{0,200}") {
        let counter = TokenCounter::default();
        prop_assert_eq!(counter.count(&s), counter.count_cached(&s));
        prop_assert_eq!(counter.count(&s), counter.count_cached(&s));
    }

    #[test]
    fn subadditivity(a in ".{0,100}", b in ".{0,100}") {
        let counter = TokenCounter::default();
        let combined = format!("{a}{b}");
        prop_assert!(counter.count(&combined) <= counter.count(&a) + counter.count(&b) + 1);
    }

    #[test]
    fn head_truncation_is_a_prefix(s in ".{1,300}", max in 1usize..40) {
        let counter = TokenCounter::default();
        let out = counter.truncate(&s, max, Keep::Head);
        prop_assert!(s.starts_with(&out));
    }

    #[test]
    fn tail_truncation_is_a_suffix(s in ".{1,300}", max in 1usize..40) {
        let counter = TokenCounter::default();
        let out = counter.truncate(&s, max, Keep::Tail);
        prop_assert!(s.ends_with(&out));
    }

    #[test]
    fn estimate_truncation_fits_budget(s in ".{0,300}", max in 1usize..40) {
        let counter = TokenCounter::approximate(64);
        let out = counter.truncate(&s, max, Keep::Head);
        prop_assert!(counter.count(&out) <= max);
    }
}

proptest! {
    #[test]
    fn segments_are_lossless(s in ".{0,300}") {
        let counter = TokenCounter::default();
        prop_assert_eq!(counter.segments(&s).concat(), s);
    }
}
