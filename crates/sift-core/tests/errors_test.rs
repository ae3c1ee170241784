use sift_core::errors::*;

#[test]
fn memory_not_found_carries_id() {
    let err = SiftError::MemoryNotFound {
        id: "abc-123".into(),
    };
    assert!(err.to_string().contains("abc-123"));
}

#[test]
fn dimension_mismatch_carries_values() {
    let err: SiftError = EmbeddingError::DimensionMismatch {
        expected: 1536,
        actual: 768,
    }
    .into();
    let msg = err.to_string();
    assert!(msg.contains("1536"));
    assert!(msg.contains("768"));
}

// --- From impls ---

#[test]
fn storage_error_converts() {
    let err: SiftError = StorageError::SqliteError {
        message: "disk full".into(),
    }
    .into();
    assert!(matches!(err, SiftError::StorageError(_)));
}

#[test]
fn entity_not_found_is_detectable() {
    let err: SiftError = EntityError::NotFound { id: "e1".into() }.into();
    assert!(err.is_entity_not_found());
    let other: SiftError = EntityError::MergeConflict {
        reason: "same entity".into(),
    }
    .into();
    assert!(!other.is_entity_not_found());
}

#[test]
fn task_error_converts() {
    let err: SiftError = TaskError::HandlerMissing {
        task_type: "extract_entities".into(),
    }
    .into();
    assert!(matches!(err, SiftError::TaskError(TaskError::HandlerMissing { .. })));
    assert!(err.to_string().contains("extract_entities"));
}

#[test]
fn json_error_converts() {
    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: SiftError = json_err.into();
    assert!(matches!(err, SiftError::SerializationError(_)));
}
