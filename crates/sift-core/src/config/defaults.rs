//! Default values for every configuration knob.

// Embedding
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;

// Deduplication
pub const DEFAULT_DUPLICATE_THRESHOLD: f64 = 0.90;
pub const DEFAULT_AUTO_MERGE_THRESHOLD: f64 = 0.95;
pub const DEFAULT_DEDUP_WINDOW_SECS: u64 = 300;

// Entities
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.85;
pub const DEFAULT_AI_ALIAS_CONFIDENCE: f64 = 0.8;
pub const DEFAULT_BULK_CONFIDENCE_THRESHOLD: f64 = 0.9;
pub const DEFAULT_AI_GROUPING_BATCH: usize = 100;

// Retrieval
pub const DEFAULT_ENTITY_WEIGHT: f64 = 1.0;
pub const DEFAULT_CONTENT_WEIGHT: f64 = 0.9;
pub const DEFAULT_RELATION_WEIGHT: f64 = 0.8;
pub const DEFAULT_TEMPORAL_WEIGHT: f64 = 0.6;
pub const DEFAULT_CONTENT_THRESHOLD: f64 = 0.7;
pub const DEFAULT_TEMPORAL_WINDOW_HOURS: f64 = 24.0;
pub const DEFAULT_RRF_K: u32 = 60;
pub const DEFAULT_KEYWORD_WEIGHT: f64 = 0.4;
pub const DEFAULT_SEMANTIC_WEIGHT: f64 = 0.6;
pub const DEFAULT_SEARCH_CANDIDATES: usize = 50;

// Delivery
pub const DEFAULT_TOKEN_BUDGET: usize = 4_000;
pub const DEFAULT_FULL_THRESHOLD: usize = 50_000;
pub const DEFAULT_SMART_CHUNK_THRESHOLD: usize = 10_000;
pub const DEFAULT_SMART_CHUNK_TOKENS: usize = 2_000;
pub const DEFAULT_CHUNK_OVERLAP_TOKENS: usize = 200;
pub const DEFAULT_EMBEDDING_WINDOW_TOKENS: usize = 512;
pub const DEFAULT_EMBEDDING_STRIDE_TOKENS: usize = 256;
pub const DEFAULT_HIERARCHY_LEVELS: [usize; 3] = [500, 2_000, 8_000];

// Scheduler
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_IDLE_POLL_MS: u64 = 100;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_BASE_MS: u64 = 500;
pub const DEFAULT_RETRY_MAX_MS: u64 = 30_000;
pub const DEFAULT_FINISHED_RETENTION_SECS: u64 = 3_600;
pub const DEFAULT_PURGE_INTERVAL_MS: u64 = 60_000;
