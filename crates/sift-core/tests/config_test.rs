use sift_core::config::defaults;
use sift_core::SiftConfig;

#[test]
fn empty_toml_yields_defaults() {
    let config = SiftConfig::from_toml("").unwrap();
    assert_eq!(config.dedup.window_secs, defaults::DEFAULT_DEDUP_WINDOW_SECS);
    assert_eq!(config.dedup.similarity_threshold, 0.9);
    assert_eq!(config.retrieval.rrf_k, 60);
    assert_eq!(config.delivery.hierarchy_levels, vec![500, 2_000, 8_000]);
    assert_eq!(config.scheduler.workers, defaults::DEFAULT_WORKERS);
}

#[test]
fn partial_toml_overrides_only_named_keys() {
    let config = SiftConfig::from_toml(
        r#"
        [dedup]
        window_secs = 60

        [dedup.context_windows]
        journal = 3600

        [retrieval.weights]
        temporal = 0.1
        "#,
    )
    .unwrap();
    assert_eq!(config.dedup.window_secs, 60);
    assert_eq!(config.dedup.auto_merge_threshold, 0.95);
    assert_eq!(config.retrieval.weights.temporal, 0.1);
    assert_eq!(config.retrieval.weights.entity, 1.0);
    assert_eq!(config.dedup.context_windows.get("journal"), Some(&3600));
}

#[test]
fn window_resolution_order() {
    let mut config = SiftConfig::default().dedup;
    config.context_windows.insert("journal".into(), 3600);
    config.platform_windows.insert("browser".into(), 30);

    assert_eq!(config.resolve_window(Some(5), "journal", Some("browser")), 5);
    assert_eq!(config.resolve_window(None, "journal", Some("browser")), 3600);
    assert_eq!(config.resolve_window(None, "work", Some("browser")), 30);
    assert_eq!(config.resolve_window(None, "work", None), 300);
}

#[test]
fn backoff_doubles_and_caps() {
    let config = SiftConfig::default().scheduler;
    assert_eq!(config.backoff_ms(1), 500);
    assert_eq!(config.backoff_ms(2), 1_000);
    assert_eq!(config.backoff_ms(3), 2_000);
    assert_eq!(config.backoff_ms(30), config.retry_max_ms);
}

#[test]
fn config_round_trips_through_toml() {
    let config = SiftConfig::default();
    let text = config.to_toml().unwrap();
    let back = SiftConfig::from_toml(&text).unwrap();
    assert_eq!(back.delivery.default_budget, config.delivery.default_budget);
}
