//! # sift-tokens
//!
//! Token counting against the cl100k_base encoding, with a blake3-keyed
//! moka cache. When the encoder cannot be loaded the counter degrades to a
//! 4-chars-per-token estimate and says so through [`TokenCounter::is_exact`].

mod counter;

pub use counter::{Keep, TokenCounter};
