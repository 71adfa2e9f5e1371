// User-facing rendering of snapshot results.
// No-data, empty and failed slots render as placeholders, never as a zero.

use serde::Serialize;

use crate::models::{AggregateResult, MetricKind, MetricOutcome, SampleResult, Snapshot};
use crate::units::Unit;

pub const NO_DATA: &str = "--";
pub const NO_READINGS: &str = "No readings";
pub const UNAVAILABLE: &str = "Unavailable";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedMetric {
    pub kind: MetricKind,
    pub label: &'static str,
    pub text: String,
}

pub fn label(kind: MetricKind) -> &'static str {
    match kind {
        MetricKind::StepCount => "Steps",
        MetricKind::WalkingRunningDistance => "Walking + Running Distance",
        MetricKind::HeartRate => "Average Heart Rate",
        MetricKind::BloodPressureSystolic => "Blood Pressure",
    }
}

pub fn render(outcome: &MetricOutcome) -> String {
    match outcome {
        MetricOutcome::Aggregate(r) => render_aggregate(r),
        MetricOutcome::Samples(r) => render_samples(r),
        MetricOutcome::Failed { .. } => UNAVAILABLE.to_string(),
    }
}

pub fn render_snapshot(snapshot: &Snapshot) -> Vec<RenderedMetric> {
    snapshot
        .results
        .iter()
        .map(|(kind, outcome)| RenderedMetric {
            kind: *kind,
            label: label(*kind),
            text: render(outcome),
        })
        .collect()
}

fn render_aggregate(r: &AggregateResult) -> String {
    let Some(value) = r.value else {
        return NO_DATA.to_string();
    };
    match r.unit {
        Unit::Count => format!("{:.0}", value),
        Unit::CountPerMinute => format!("{:.0} BPM", value),
        unit => format!("{:.2} {}", value, unit.symbol().to_uppercase()),
    }
}

fn render_samples(r: &SampleResult) -> String {
    if r.is_empty() {
        return NO_READINGS.to_string();
    }
    let values: Vec<String> = r
        .entries
        .iter()
        .map(|e| format!("{:.0}", e.value))
        .collect();
    match r.kind {
        MetricKind::BloodPressureSystolic => format!("{} Systolic", values.join(", ")),
        _ => values.join(", "),
    }
}
