mod embedding;
mod extractor;
mod generator;
mod storage;

pub use embedding::IEmbeddingGateway;
pub use extractor::IEntityExtractor;
pub use generator::ITextGenerator;
pub use storage::{IGraphStore, IMemoryStore};
