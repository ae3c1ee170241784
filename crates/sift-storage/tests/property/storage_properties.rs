//! Property tests: insert→get roundtrip, embedding blob fidelity.

use chrono::Utc;
use proptest::prelude::*;

use sift_core::models::NewMemory;
use sift_core::traits::IMemoryStore;
use sift_storage::StorageEngine;

proptest! {
    #[test]
    fn prop_insert_get_roundtrip(content in "[a-zA-Z0-9 .,]{1,200}") {
        let engine = StorageEngine::open_in_memory().unwrap();
        let record = NewMemory::new(content.clone()).into_record(Utc::now());
        engine.insert_memory(&record).unwrap();

        let loaded = engine.get_memory(&record.id).unwrap().unwrap();
        prop_assert_eq!(&loaded.content, &content);
        prop_assert_eq!(&loaded.content_hash, &record.content_hash);
    }

    #[test]
    fn prop_embedding_blob_is_lossless(values in prop::collection::vec(-1.0e6f32..1.0e6, 1..64)) {
        let engine = StorageEngine::open_in_memory().unwrap();
        let record = NewMemory::new("v").into_record(Utc::now());
        engine.insert_memory(&record).unwrap();
        engine.set_embedding(&record.id, &values, "m").unwrap();

        let loaded = engine.get_memory(&record.id).unwrap().unwrap();
        prop_assert_eq!(loaded.embedding, Some(values));
    }
}
