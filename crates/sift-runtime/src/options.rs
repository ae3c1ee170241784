use std::path::PathBuf;
use std::sync::Arc;

use sift_core::traits::{IEmbeddingGateway, IEntityExtractor, ITextGenerator};

/// Options for starting a [`SiftRuntime`](crate::SiftRuntime).
#[derive(Default, Clone)]
pub struct RuntimeOptions {
    /// SQLite database path. `None` opens an in-memory database.
    pub db_path: Option<PathBuf>,
    /// TOML configuration. `None` uses defaults.
    pub config_toml: Option<String>,
    /// Embedding provider. Without one, dedup and vector search are skipped
    /// and no embedding jobs are scheduled.
    pub gateway: Option<Arc<dyn IEmbeddingGateway>>,
    /// Enables smart memory merges and AI alias grouping.
    pub generator: Option<Arc<dyn ITextGenerator>>,
    /// Enables background entity extraction.
    pub extractor: Option<Arc<dyn IEntityExtractor>>,
}

impl RuntimeOptions {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    pub fn with_config_toml(mut self, toml: impl Into<String>) -> Self {
        self.config_toml = Some(toml.into());
        self
    }

    pub fn with_gateway(mut self, gateway: Arc<dyn IEmbeddingGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn ITextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn IEntityExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }
}
