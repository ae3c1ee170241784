use crate::errors::SiftResult;

/// Generative text step (smart memory merge, alias grouping).
pub trait ITextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> SiftResult<String>;

    fn is_available(&self) -> bool {
        true
    }
}
