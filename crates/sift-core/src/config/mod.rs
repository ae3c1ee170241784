//! Configuration. Every section deserializes with defaults so a partial TOML
//! file (or none at all) yields a working setup.

pub mod defaults;
mod dedup_config;
mod delivery_config;
mod embedding_config;
mod entity_config;
mod retrieval_config;
mod scheduler_config;

pub use dedup_config::DedupConfig;
pub use delivery_config::DeliveryConfig;
pub use embedding_config::EmbeddingConfig;
pub use entity_config::EntityConfig;
pub use retrieval_config::{RetrievalConfig, StrategyWeights};
pub use scheduler_config::SchedulerConfig;

use serde::{Deserialize, Serialize};

/// Root configuration for the whole layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiftConfig {
    pub embedding: EmbeddingConfig,
    pub dedup: DedupConfig,
    pub entity: EntityConfig,
    pub retrieval: RetrievalConfig,
    pub delivery: DeliveryConfig,
    pub scheduler: SchedulerConfig,
}

impl SiftConfig {
    /// Parse a TOML document into a config, filling unspecified keys with defaults.
    pub fn from_toml(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Serialize back to TOML (used to dump the effective configuration).
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
