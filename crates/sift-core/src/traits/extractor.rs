use crate::errors::SiftResult;
use crate::models::ExtractionResult;

/// Entity/relation extraction from memory content.
pub trait IEntityExtractor: Send + Sync {
    fn extract(&self, content: &str) -> SiftResult<ExtractionResult>;
}
