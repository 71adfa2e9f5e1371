// Model serialization tests (JSON shapes served over HTTP and WebSocket)

mod common;

use chrono::Utc;
use common::{at, week_window};
use healthmetrics::models::*;
use healthmetrics::units::Unit;
use std::collections::BTreeMap;

fn snapshot() -> Snapshot {
    let mut results = BTreeMap::new();
    results.insert(
        MetricKind::StepCount,
        MetricOutcome::Aggregate(AggregateResult {
            kind: MetricKind::StepCount,
            value: Some(12345.0),
            unit: Unit::Count,
        }),
    );
    results.insert(
        MetricKind::HeartRate,
        MetricOutcome::Aggregate(AggregateResult::no_data(
            MetricKind::HeartRate,
            Unit::CountPerMinute,
        )),
    );
    results.insert(
        MetricKind::BloodPressureSystolic,
        MetricOutcome::Samples(SampleResult {
            kind: MetricKind::BloodPressureSystolic,
            entries: vec![SampleEntry {
                value: 120.0,
                unit: Unit::MillimeterOfMercury,
                recorded_at: at(1, 7),
            }],
        }),
    );
    results.insert(
        MetricKind::WalkingRunningDistance,
        MetricOutcome::Failed {
            error: "transport error: reset".into(),
        },
    );
    let mut window_overrides = BTreeMap::new();
    window_overrides.insert(
        MetricKind::HeartRate,
        TimeWindow::new(at(4, 0), at(5, 0), Inclusivity::StrictEnd).unwrap(),
    );
    Snapshot {
        window: week_window(),
        window_overrides,
        collected_at: Utc::now(),
        results,
    }
}

#[test]
fn test_snapshot_serialization_shape() {
    let json = serde_json::to_value(snapshot()).unwrap();
    assert!(json.get("collectedAt").is_some());
    assert_eq!(json["window"]["inclusivity"], "strict_start");
    assert_eq!(
        json["windowOverrides"]["heart_rate"]["inclusivity"],
        "strict_end"
    );
    assert!(json["windowOverrides"].get("step_count").is_none());

    let steps = &json["results"]["step_count"];
    assert_eq!(steps["status"], "aggregate");
    assert_eq!(steps["value"], 12345.0);
    assert_eq!(steps["unit"], "count");

    let hr = &json["results"]["heart_rate"];
    assert!(hr["value"].is_null());
    assert_eq!(hr["unit"], "count/min");

    let bp = &json["results"]["blood_pressure_systolic"];
    assert_eq!(bp["status"], "samples");
    assert_eq!(bp["entries"][0]["unit"], "mmHg");
    assert!(bp["entries"][0].get("recordedAt").is_some());

    let distance = &json["results"]["walking_running_distance"];
    assert_eq!(distance["status"], "failed");
    assert_eq!(distance["error"], "transport error: reset");
}

#[test]
fn test_snapshot_accessors() {
    let s = snapshot();
    assert_eq!(s.aggregate(MetricKind::StepCount).unwrap().value, Some(12345.0));
    assert!(s.samples(MetricKind::StepCount).is_none());
    assert_eq!(s.samples(MetricKind::BloodPressureSystolic).unwrap().entries.len(), 1);
    assert!(s.aggregate(MetricKind::WalkingRunningDistance).is_none());
    assert_eq!(s.failed_count(), 1);
    assert_eq!(s.window_for(MetricKind::StepCount), &week_window());
    assert_eq!(s.window_for(MetricKind::HeartRate).start(), at(4, 0));
}

#[test]
fn test_metric_kind_snake_case() {
    let json = serde_json::to_string(&MetricKind::WalkingRunningDistance).unwrap();
    assert_eq!(json, "\"walking_running_distance\"");
    let back: MetricKind = serde_json::from_str("\"blood_pressure_systolic\"").unwrap();
    assert_eq!(back, MetricKind::BloodPressureSystolic);
    assert_eq!(MetricKind::HeartRate.to_string(), "heart_rate");
}
