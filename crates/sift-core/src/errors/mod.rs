//! Error taxonomy. Every subsystem has its own enum; all of them convert into
//! [`SiftError`] so public operations return one typed failure.

mod embedding_error;
mod entity_error;
mod retrieval_error;
mod storage_error;
mod task_error;

pub use embedding_error::EmbeddingError;
pub use entity_error::EntityError;
pub use retrieval_error::RetrievalError;
pub use storage_error::StorageError;
pub use task_error::TaskError;

/// Top-level error for every public Sift operation.
#[derive(Debug, thiserror::Error)]
pub enum SiftError {
    #[error("memory not found: {id}")]
    MemoryNotFound { id: String },

    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("embedding error: {0}")]
    EmbeddingError(#[from] EmbeddingError),

    #[error("entity error: {0}")]
    EntityError(#[from] EntityError),

    #[error("task error: {0}")]
    TaskError(#[from] TaskError),

    #[error("retrieval error: {0}")]
    RetrievalError(#[from] RetrievalError),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl SiftError {
    /// Whether this error means a referenced entity does not exist.
    pub fn is_entity_not_found(&self) -> bool {
        matches!(self, SiftError::EntityError(EntityError::NotFound { .. }))
    }
}

pub type SiftResult<T> = Result<T, SiftError>;
