mod common;

use chrono::{Duration, Utc};
use codegauge::{CalculatorRegistry, MetricsConfig, MetricsData, MetricsEngine, MetricsStore};
use common::sample_codebase;
use std::sync::Arc;

fn computed_run() -> MetricsData {
    let registry = Arc::new(CalculatorRegistry::with_standard_calculators().unwrap());
    let engine = MetricsEngine::with_registry(MetricsConfig::default(), registry);
    engine.calculate_codebase_metrics(&sample_codebase()).unwrap()
}

#[test]
fn store_then_latest_round_trips_the_codebase_row() {
    let mut store = MetricsStore::open_in_memory().unwrap();
    let data = computed_run();

    let run_id = store.store_metrics_data(&data).unwrap();
    assert!(run_id > 0);

    let latest = store.get_latest_metrics("sample").unwrap().unwrap();
    assert_eq!(latest.run_id, run_id);
    assert_eq!(latest.duration_ms, data.duration_ms);
    assert_eq!(latest.codebase, data.codebase);
}

#[test]
fn latest_picks_the_most_recent_run() {
    let mut store = MetricsStore::open_in_memory().unwrap();

    let mut old_run = computed_run();
    old_run.codebase.calculated_at = Utc::now() - Duration::days(10);
    store.store_metrics_data(&old_run).unwrap();

    let new_run = computed_run();
    let new_id = store.store_metrics_data(&new_run).unwrap();

    let latest = store.get_latest_metrics("sample").unwrap().unwrap();
    assert_eq!(latest.run_id, new_id);
    assert_eq!(latest.codebase.calculated_at, new_run.codebase.calculated_at);
}

#[test]
fn unknown_project_has_no_latest() {
    let store = MetricsStore::open_in_memory().unwrap();
    assert!(store.get_latest_metrics("nope").unwrap().is_none());
}

#[test]
fn new_runs_insert_new_rows_never_overwrite() {
    let mut store = MetricsStore::open_in_memory().unwrap();
    let data = computed_run();

    let first = store.store_metrics_data(&data).unwrap();
    let second = store.store_metrics_data(&data).unwrap();
    assert_ne!(first, second);

    let history = store.get_metrics_history("sample", 30, None).unwrap();
    assert_eq!(history.len(), 2);
}

#[test]
fn history_respects_the_day_window() {
    let mut store = MetricsStore::open_in_memory().unwrap();

    let mut old_run = computed_run();
    old_run.codebase.calculated_at = Utc::now() - Duration::days(10);
    store.store_metrics_data(&old_run).unwrap();

    let recent = computed_run();
    store.store_metrics_data(&recent).unwrap();

    let wide = store.get_metrics_history("sample", 30, None).unwrap();
    assert_eq!(wide.len(), 2);
    // Oldest first
    assert!(wide[0].calculated_at < wide[1].calculated_at);

    let narrow = store.get_metrics_history("sample", 5, None).unwrap();
    assert_eq!(narrow.len(), 1);
    assert_eq!(narrow[0].calculated_at, wide[1].calculated_at);
}

#[test]
fn history_filters_to_requested_metric_names() {
    let mut store = MetricsStore::open_in_memory().unwrap();
    store.store_metrics_data(&computed_run()).unwrap();

    let points = store
        .get_metrics_history("sample", 30, Some(&["average_maintainability_index"]))
        .unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].values.len(), 1);
    assert!(points[0]
        .values
        .contains_key("average_maintainability_index"));

    let all = store.get_metrics_history("sample", 30, None).unwrap();
    assert!(all[0].values.len() > 1);
    assert_eq!(
        all[0].values["total_files"],
        computed_run().codebase.total_files as f64
    );
}

#[test]
fn unknown_metric_names_are_ignored() {
    let mut store = MetricsStore::open_in_memory().unwrap();
    store.store_metrics_data(&computed_run()).unwrap();

    let points = store
        .get_metrics_history("sample", 30, Some(&["no_such_metric", "total_files"]))
        .unwrap();
    assert_eq!(points[0].values.len(), 1);
    assert!(points[0].values.contains_key("total_files"));
}

#[test]
fn failed_transaction_leaves_no_partial_rows() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("metrics.db");

    let mut store = MetricsStore::open(&db_path).unwrap();

    // A second connection holding an exclusive lock makes every write in
    // the store's transaction fail
    let blocker = rusqlite::Connection::open(&db_path).unwrap();
    blocker.execute_batch("BEGIN EXCLUSIVE").unwrap();

    let result = store.store_metrics_data(&computed_run());
    assert!(result.is_err());

    blocker.execute_batch("COMMIT").unwrap();
    drop(blocker);

    // The rolled-back run left nothing behind; in-memory data is still
    // usable and a retry succeeds
    assert!(store.get_latest_metrics("sample").unwrap().is_none());
    let retry = store.store_metrics_data(&computed_run());
    assert!(retry.is_ok());
}

#[test]
fn persisted_structure_counts_survive_round_trip() {
    let mut store = MetricsStore::open_in_memory().unwrap();
    let data = computed_run();
    store.store_metrics_data(&data).unwrap();

    let latest = store.get_latest_metrics("sample").unwrap().unwrap();
    assert_eq!(latest.codebase.total_files, data.file_metrics.len());
    assert_eq!(
        latest.codebase.total_classes,
        data.class_metrics.values().map(Vec::len).sum::<usize>()
    );
    assert_eq!(
        latest.codebase.total_functions,
        data.function_metrics.values().map(Vec::len).sum::<usize>()
    );
}
