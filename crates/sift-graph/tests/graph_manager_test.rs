//! EntityGraphManager against the SQLite store.

use std::sync::Arc;

use chrono::{DateTime, Duration, DurationRound, Utc};

use sift_core::config::EntityConfig;
use sift_core::models::{
    Entity, ExtractedEntity, ExtractedRelation, ExtractionResult, MergeStrategy, NewMemory,
};
use sift_core::traits::{IGraphStore, IMemoryStore};
use sift_core::SiftError;
use sift_graph::{DetectionMethod, EntityGraphManager, TimelineEventKind};
use sift_storage::StorageEngine;
use test_fixtures::mocks::MockGenerator;

fn setup() -> (Arc<StorageEngine>, EntityGraphManager) {
    let store = Arc::new(StorageEngine::open_in_memory().unwrap());
    let manager = EntityGraphManager::new(store.clone(), store.clone(), EntityConfig::default());
    (store, manager)
}

fn base_time() -> DateTime<Utc> {
    Utc::now().duration_trunc(Duration::seconds(1)).unwrap() - Duration::hours(1)
}

/// Insert an entity created `offset_secs` after the base time.
fn entity_at(store: &StorageEngine, name: &str, kind: &str, offset_secs: i64) -> Entity {
    let e = Entity::new(name, kind, base_time() + Duration::seconds(offset_secs));
    store.insert_entity(&e).unwrap();
    e
}

fn memory_at(store: &StorageEngine, content: &str, offset_secs: i64) -> String {
    let m = NewMemory::new(content).into_record(base_time() + Duration::seconds(offset_secs));
    store.insert_memory(&m).unwrap();
    m.id
}

fn extraction(entities: &[(&str, &str, f64)], relations: &[(&str, &str, &str)]) -> ExtractionResult {
    ExtractionResult {
        entities: entities
            .iter()
            .map(|(name, kind, relevance)| ExtractedEntity {
                name: name.to_string(),
                entity_type: kind.to_string(),
                description: String::new(),
                relevance: *relevance,
            })
            .collect(),
        relations: relations
            .iter()
            .map(|(from, to, kind)| ExtractedRelation {
                from: from.to_string(),
                to: to.to_string(),
                relation_type: kind.to_string(),
            })
            .collect(),
    }
}

fn names_of<'a>(pair: &'a sift_graph::DuplicatePair) -> [&'a str; 2] {
    let mut names = [pair.primary_name.as_str(), pair.secondary_name.as_str()];
    names.sort();
    names
}

// ── Detection ─────────────────────────────────────────────────────────────

#[test]
fn golden_duplicate_entities() {
    let golden = test_fixtures::load_fixture_value("golden/entity/duplicate_entities.json");
    let (store, manager) = setup();
    for (i, e) in golden["entities"].as_array().unwrap().iter().enumerate() {
        entity_at(
            &store,
            e["name"].as_str().unwrap(),
            e["entity_type"].as_str().unwrap(),
            i as i64,
        );
    }

    let pairs = manager.find_duplicate_entities(None).unwrap();
    for window in pairs.windows(2) {
        assert!(window[0].confidence >= window[1].confidence);
    }

    let find = |a: &str, b: &str| {
        let mut wanted = [a, b];
        wanted.sort();
        pairs.iter().find(|p| names_of(p) == wanted)
    };

    for expected in golden["expected_pairs"].as_array().unwrap() {
        let (a, b) = (expected["a"].as_str().unwrap(), expected["b"].as_str().unwrap());
        let pair = find(a, b).unwrap_or_else(|| panic!("missing pair {a} / {b}"));
        assert_eq!(pair.method.to_string(), expected["method"].as_str().unwrap());
        if let Some(exact) = expected["confidence"].as_f64() {
            assert!((pair.confidence - exact).abs() < 1e-9);
        }
        if let Some(min) = expected["min_confidence"].as_f64() {
            assert!(pair.confidence > min, "{a}/{b}: {}", pair.confidence);
        }
    }
    for not_pair in golden["not_pairs"].as_array().unwrap() {
        let (a, b) = (not_pair["a"].as_str().unwrap(), not_pair["b"].as_str().unwrap());
        assert!(find(a, b).is_none(), "unexpected pair {a} / {b}");
    }
}

#[test]
fn older_entity_is_primary_in_detected_pairs() {
    let (store, manager) = setup();
    let newer = entity_at(&store, "rust", "game", 50);
    let older = entity_at(&store, "Rust", "language", 0);
    let pairs = manager.find_duplicate_entities(None).unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].primary_id, older.id);
    assert_eq!(pairs[0].secondary_id, newer.id);
}

#[test]
fn ai_grouping_adds_alias_pairs() {
    let (store, _) = setup();
    entity_at(&store, "K8s", "technology", 0);
    entity_at(&store, "Kubernetes", "technology", 1);
    entity_at(&store, "Docker", "technology", 2);

    let generator = Arc::new(MockGenerator::replying(r#"[["K8s", "Kubernetes"]]"#));
    let manager = EntityGraphManager::new(store.clone(), store.clone(), EntityConfig::default())
        .with_generator(generator.clone());

    let pairs = manager.find_duplicate_entities(None).unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].method, DetectionMethod::AiAlias);
    assert!((pairs[0].confidence - 0.8).abs() < 1e-9);
    assert_eq!(generator.prompts().len(), 1);
}

#[test]
fn unparsable_grouping_answer_is_ignored() {
    let (store, _) = setup();
    entity_at(&store, "K8s", "technology", 0);
    entity_at(&store, "Kubernetes", "technology", 1);
    let manager = EntityGraphManager::new(store.clone(), store.clone(), EntityConfig::default())
        .with_generator(Arc::new(MockGenerator::replying("I am not sure.")));
    assert!(manager.find_duplicate_entities(None).unwrap().is_empty());

    let failing = EntityGraphManager::new(store.clone(), store.clone(), EntityConfig::default())
        .with_generator(Arc::new(MockGenerator::failing()));
    assert!(failing.find_duplicate_entities(None).unwrap().is_empty());
}

// ── Merge ─────────────────────────────────────────────────────────────────

#[test]
fn merging_with_a_retired_id_is_not_found() {
    let (store, manager) = setup();
    let a = entity_at(&store, "Alpha", "t", 0);
    let b = entity_at(&store, "Alpha Inc", "t", 1);
    let c = entity_at(&store, "Gamma", "t", 2);

    manager.merge_entities(&a.id, &b.id, MergeStrategy::KeepPrimary).unwrap();

    let again = manager.merge_entities(&a.id, &b.id, MergeStrategy::KeepPrimary).unwrap_err();
    assert!(again.is_entity_not_found());
    let as_primary = manager.merge_entities(&b.id, &c.id, MergeStrategy::KeepPrimary).unwrap_err();
    assert!(as_primary.is_entity_not_found());
    assert!(store.get_entity(&c.id).unwrap().is_some(), "failed merge must not touch the other side");
}

#[test]
fn merging_an_entity_into_itself_conflicts() {
    let (store, manager) = setup();
    let a = entity_at(&store, "Alpha", "t", 0);
    let err = manager.merge_entities(&a.id, &a.id, MergeStrategy::Combine).unwrap_err();
    assert!(matches!(
        err,
        SiftError::EntityError(sift_core::errors::EntityError::MergeConflict { .. })
    ));
}

#[test]
fn combine_references_both_names() {
    let (store, manager) = setup();
    let mut openai = Entity::new("OpenAI", "organization", base_time());
    openai.description = "AI research lab".into();
    store.insert_entity(&openai).unwrap();
    let other = entity_at(&store, "open ai", "organization", 5);
    let m = memory_at(&store, "open ai released a model", 10);
    store
        .replace_associations(
            &m,
            &[sift_core::models::MemoryEntityAssociation {
                memory_id: m.clone(),
                entity_id: other.id.clone(),
                relevance: 0.9,
            }],
        )
        .unwrap();

    let stats = manager
        .merge_entities(&openai.id, &other.id, MergeStrategy::Combine)
        .unwrap();
    assert_eq!(stats.memories_affected, 1);

    let survivor = store.get_entity(&openai.id).unwrap().unwrap();
    assert_eq!(survivor.name, "OpenAI");
    assert!(survivor.description.contains("AI research lab"));
    assert!(survivor.description.contains("OpenAI"));
    assert!(survivor.description.contains("open ai"));
    assert!(survivor.aliases.iter().any(|a| a == "open ai"));
    assert_eq!(store.associations_for_memory(&m).unwrap()[0].entity_id, openai.id);
}

#[test]
fn resolve_follows_forwarding() {
    let (store, manager) = setup();
    let a = entity_at(&store, "A", "t", 0);
    let b = entity_at(&store, "B", "t", 1);
    let c = entity_at(&store, "C", "t", 2);
    manager.merge_entities(&b.id, &c.id, MergeStrategy::KeepPrimary).unwrap();
    manager.merge_entities(&a.id, &b.id, MergeStrategy::KeepPrimary).unwrap();

    assert_eq!(manager.resolve_entity_id(&c.id).unwrap(), Some(a.id.clone()));
    assert_eq!(manager.resolve_entity_id(&a.id).unwrap(), Some(a.id.clone()));
    assert_eq!(manager.resolve_entity_id("never-existed").unwrap(), None);
}

// ── Timeline ──────────────────────────────────────────────────────────────

#[test]
fn timeline_is_newest_first_and_follows_merges() {
    let (store, manager) = setup();
    let rust = entity_at(&store, "Rust", "language", 0);
    let m1 = memory_at(&store, "learning rust", 100);
    let m2 = memory_at(&store, "rust 2024 edition", 200);
    manager
        .ingest_extraction(&m1, &extraction(&[("Rust", "language", 0.9)], &[]))
        .unwrap();
    manager
        .ingest_extraction(&m2, &extraction(&[("Rust", "language", 0.5)], &[]))
        .unwrap();
    let alias = entity_at(&store, "rust-lang", "language", 300);
    manager
        .merge_entities(&rust.id, &alias.id, MergeStrategy::KeepPrimary)
        .unwrap();

    let timeline = manager.get_entity_timeline(&rust.id).unwrap();
    assert!(timeline.found);
    let kinds: Vec<&TimelineEventKind> = timeline.events.iter().map(|e| &e.kind).collect();
    assert_eq!(kinds.len(), 4);
    assert!(matches!(kinds[0], TimelineEventKind::Absorbed { secondary_name, .. } if secondary_name == "rust-lang"));
    assert!(matches!(kinds[1], TimelineEventKind::Mentioned { memory_id, .. } if *memory_id == m2));
    assert!(matches!(kinds[2], TimelineEventKind::Mentioned { memory_id, .. } if *memory_id == m1));
    assert_eq!(*kinds[3], TimelineEventKind::Created);
    for window in timeline.events.windows(2) {
        assert!(window[0].at >= window[1].at);
    }

    let via_retired = manager.get_entity_timeline(&alias.id).unwrap();
    assert!(via_retired.found);
    assert_eq!(via_retired.entity.unwrap().id, rust.id);

    let unknown = manager.get_entity_timeline("nobody").unwrap();
    assert!(!unknown.found);
    assert!(unknown.events.is_empty());
}

// ── Bulk deduplication ────────────────────────────────────────────────────

#[test]
fn bulk_merges_chains_consistently() {
    let (store, manager) = setup();
    let first = entity_at(&store, "PostgreSQL", "technology", 0);
    entity_at(&store, "PostgreSQLs", "technology", 1);
    entity_at(&store, "postgresql", "technology", 2);

    let report = manager.bulk_deduplicate(true, Some(0.9)).unwrap();
    assert_eq!(report.candidates, 3);
    assert_eq!(report.merged.len(), 2);
    assert_eq!(report.skipped, 1);
    assert!(report.failures.is_empty());
    assert!(report.manual_review.is_empty());
    assert!(report.merged.iter().all(|m| m.strategy == MergeStrategy::KeepPrimary));

    let remaining = store.list_entities().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, first.id);
    assert!(remaining[0].answers_to("PostgreSQLs"));
}

#[test]
fn bulk_without_auto_merge_only_reports() {
    let (store, manager) = setup();
    entity_at(&store, "Rust", "language", 0);
    entity_at(&store, "rust", "language", 1);
    entity_at(&store, "OpenAI", "organization", 2);
    entity_at(&store, "open ai", "organization", 3);

    let report = manager.bulk_deduplicate(false, None).unwrap();
    assert!(report.merged.is_empty());
    assert_eq!(report.manual_review.len(), 2);
    assert_eq!(report.manual_review[0].reason, "names match ignoring case");
    assert!(report.manual_review[1].reason.starts_with("name similarity"));
    assert_eq!(store.list_entities().unwrap().len(), 4);
}

#[test]
fn bulk_leaves_low_confidence_pairs_for_review() {
    let (store, manager) = setup();
    entity_at(&store, "OpenAI", "organization", 0);
    entity_at(&store, "open ai", "organization", 1);

    let report = manager.bulk_deduplicate(true, None).unwrap();
    assert!(report.merged.is_empty());
    assert_eq!(report.manual_review.len(), 1);
    assert_eq!(report.manual_review[0].method, DetectionMethod::FuzzyName);
}

#[test]
fn bulk_combines_ai_detected_aliases() {
    let (store, _) = setup();
    let k8s = entity_at(&store, "K8s", "technology", 0);
    entity_at(&store, "Kubernetes", "technology", 1);
    let manager = EntityGraphManager::new(store.clone(), store.clone(), EntityConfig::default())
        .with_generator(Arc::new(MockGenerator::replying(r#"[["K8s","Kubernetes"]]"#)));

    let report = manager.bulk_deduplicate(true, Some(0.8)).unwrap();
    assert_eq!(report.merged.len(), 1);
    assert_eq!(report.merged[0].strategy, MergeStrategy::Combine);
    let survivor = store.get_entity(&k8s.id).unwrap().unwrap();
    assert!(survivor.description.contains("Kubernetes"));
}

// ── Extraction ingest ─────────────────────────────────────────────────────

#[test]
fn ingest_upserts_entities_and_relations() {
    let (store, manager) = setup();
    let m1 = memory_at(&store, "tokio is written in rust", 0);
    let report = manager
        .ingest_extraction(
            &m1,
            &extraction(
                &[("Rust", "language", 0.9), ("Tokio", "library", 0.7), ("rust", "language", 0.95)],
                &[("Tokio", "Rust", "written_in"), ("Serde", "Rust", "written_in")],
            ),
        )
        .unwrap();
    assert_eq!(report.entities_created, 2);
    assert_eq!(report.associations, 2);
    assert_eq!(report.relations_added, 1);
    assert_eq!(report.relations_unresolved, 1);
    assert!(store.get_memory(&m1).unwrap().unwrap().extracted);

    let rust = store.find_entities_by_name("RUST").unwrap();
    assert_eq!(rust.len(), 1);
    let assoc = store.associations_for_memory(&m1).unwrap();
    let rust_assoc = assoc.iter().find(|a| a.entity_id == rust[0].id).unwrap();
    assert!((rust_assoc.relevance - 0.95).abs() < 1e-9);

    // Same names in another memory reuse the entities; relations stay unique.
    let m2 = memory_at(&store, "more tokio", 10);
    let second = manager
        .ingest_extraction(
            &m2,
            &extraction(&[("tokio", "library", 0.8), ("Rust", "language", 0.2)], &[("Tokio", "Rust", "written_in")]),
        )
        .unwrap();
    assert_eq!(second.entities_created, 0);
    assert_eq!(second.entities_matched, 2);
    assert_eq!(second.relations_added, 0);
    assert_eq!(store.list_entities().unwrap().len(), 2);
}

#[test]
fn reingest_replaces_associations() {
    let (store, manager) = setup();
    let m = memory_at(&store, "note", 0);
    manager
        .ingest_extraction(&m, &extraction(&[("A", "t", 0.5), ("B", "t", 0.5)], &[]))
        .unwrap();
    manager
        .ingest_extraction(&m, &extraction(&[("A", "t", 0.7)], &[]))
        .unwrap();
    let assoc = store.associations_for_memory(&m).unwrap();
    assert_eq!(assoc.len(), 1);
    assert!((assoc[0].relevance - 0.7).abs() < 1e-9);
}

#[test]
fn ingest_for_missing_memory_fails() {
    let (_, manager) = setup();
    let err = manager
        .ingest_extraction("ghost", &extraction(&[("A", "t", 0.5)], &[]))
        .unwrap_err();
    assert!(matches!(err, SiftError::MemoryNotFound { .. }));
}
