/// Sift system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tag marking a memory written by an automatic capture path (not typed by a person).
pub const AUTO_CAPTURE_TAG: &str = "auto-capture";

/// Context partition used when the caller does not name one.
pub const DEFAULT_CONTEXT: &str = "default";

/// Characters per token used when no tokenizer is available.
pub const APPROX_CHARS_PER_TOKEN: usize = 4;

/// Marker placed between the overlap prefix and the body of a chunk.
pub const CHUNK_OVERLAP_MARKER: &str = "... ";

/// Maximum number of characters of content shown in a duplicate preview.
pub const DUPLICATE_PREVIEW_CHARS: usize = 200;

/// Maximum relation hops followed by relation-based retrieval.
pub const MAX_RELATION_HOPS: usize = 2;
