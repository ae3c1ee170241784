/// Entity graph errors.
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    #[error("entity not found: {id}")]
    NotFound { id: String },

    #[error("merge conflict: {reason}")]
    MergeConflict { reason: String },
}
