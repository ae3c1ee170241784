use crate::errors::SiftResult;

/// Embedding generation gateway.
///
/// Vector dimension and determinism are a provider contract; callers treat
/// any mismatch as a hard error.
pub trait IEmbeddingGateway: Send + Sync {
    /// Document-mode embeddings for a batch of texts, one vector per text.
    fn embed_texts(&self, texts: &[String]) -> SiftResult<Vec<Vec<f32>>>;

    /// Query-mode embedding. May differ from the document-mode vector of the same text.
    fn embed_query(&self, text: &str) -> SiftResult<Vec<f32>>;

    /// The dimensionality of vectors produced by this gateway.
    fn dimensions(&self) -> usize;

    /// Model tag stored next to each embedding.
    fn model_name(&self) -> &str;

    /// Whether the gateway can currently serve requests.
    fn is_available(&self) -> bool;
}
