// In-memory provider: loading data sets from disk and querying through the trait

use chrono::{TimeZone, Utc};
use healthmetrics::models::{Inclusivity, MetricKind, TimeWindow};
use healthmetrics::provider::{
    HealthProvider, MemoryProvider, SampleQuery, Statistic, StoredSample,
};
use healthmetrics::query::SampleSeriesQueryRunner;
use healthmetrics::registry::{MetricRegistry, ids};
use std::sync::Arc;
use healthmetrics::units::Unit;

const DATA_SET: &str = r#"{
  "samples": [
    { "type": "step_count", "value": 500, "unit": "count", "start": "2026-03-10T07:00:00Z", "end": "2026-03-10T08:00:00Z" },
    { "type": "step_count", "value": 250, "unit": "count", "start": "2026-03-10T12:00:00Z", "end": "2026-03-10T13:00:00Z" },
    { "type": "distance_walking_running", "value": 2, "unit": "km", "start": "2026-03-10T07:00:00Z", "end": "2026-03-10T08:00:00Z" },
    { "type": "blood_pressure_systolic", "value": 16, "unit": "kPa", "start": "2026-03-10T08:00:00Z" }
  ]
}"#;

fn day() -> TimeWindow {
    TimeWindow::new(
        Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 11, 0, 0, 0).unwrap(),
        Inclusivity::StrictStart,
    )
    .unwrap()
}

#[tokio::test]
async fn load_from_file_and_query() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("health.json");
    std::fs::write(&path, DATA_SET).unwrap();

    let provider = MemoryProvider::load(&path).expect("load data set");
    let steps = provider
        .run_aggregate_query(ids::STEP_COUNT, &day(), Statistic::Sum)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(steps.value, 750.0);
    assert_eq!(steps.unit, Unit::Count);

    // Stored in km, answered in the provider's native miles.
    let distance = provider
        .run_aggregate_query(ids::DISTANCE_WALKING_RUNNING, &day(), Statistic::Sum)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(distance.unit, Unit::Mile);
    assert!((distance.value - 2000.0 / 1609.344).abs() < 1e-9);

    let readings = provider
        .run_sample_query(
            ids::BLOOD_PRESSURE_SYSTOLIC,
            &SampleQuery {
                window: None,
                limit: 7,
                sort_descending: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(readings.len(), 1);
}

#[test]
fn load_missing_file_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    assert!(MemoryProvider::load(dir.path().join("absent.json")).is_err());
}

#[test]
fn load_rejects_end_before_start() {
    let bad = r#"{ "samples": [
        { "type": "step_count", "value": 1, "unit": "count", "start": "2026-03-10T08:00:00Z", "end": "2026-03-10T07:00:00Z" }
    ] }"#;
    assert!(MemoryProvider::load_from_str(bad).is_err());
}

#[test]
fn bundled_data_set_loads_and_supports_registry() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/health.json");
    let provider = MemoryProvider::load(path).expect("bundled data set");
    assert!(
        MetricRegistry::standard()
            .validate_against(&provider)
            .is_ok()
    );
}

#[tokio::test]
async fn limited_fetch_keeps_latest_recorded_reading() {
    let t = |h, m| Utc.with_ymd_and_hms(2026, 3, 10, h, m, 0).unwrap();
    // The long reading ends last but was recorded first.
    let provider = Arc::new(MemoryProvider::with_samples(vec![
        StoredSample::new(
            ids::BLOOD_PRESSURE_SYSTOLIC,
            130.0,
            Unit::MillimeterOfMercury,
            t(8, 0),
            t(12, 0),
        ),
        StoredSample::new(
            ids::BLOOD_PRESSURE_SYSTOLIC,
            118.0,
            Unit::MillimeterOfMercury,
            t(10, 0),
            t(10, 30),
        ),
    ]));
    let registry = MetricRegistry::standard();
    let descriptor = registry.get(MetricKind::BloodPressureSystolic).unwrap();
    let newest = SampleQuery {
        window: None,
        limit: 1,
        sort_descending: true,
    };

    let raw = provider
        .run_sample_query(ids::BLOOD_PRESSURE_SYSTOLIC, &newest)
        .await
        .unwrap();
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].start, t(10, 0));

    let result = SampleSeriesQueryRunner::new(provider.clone())
        .run(descriptor, &newest)
        .await
        .unwrap();
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].value, 118.0);
    assert_eq!(result.entries[0].recorded_at, t(10, 0));

    let oldest = SampleQuery {
        sort_descending: false,
        ..newest
    };
    let result = SampleSeriesQueryRunner::new(provider)
        .run(descriptor, &oldest)
        .await
        .unwrap();
    assert_eq!(result.entries[0].recorded_at, t(8, 0));
}
