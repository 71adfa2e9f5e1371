// Per-metric query results: scalar aggregates, sample series, failures

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::MetricKind;
use crate::units::Unit;

/// `value` is `None` when the provider holds no samples for the window,
/// which is distinct from a measured zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub kind: MetricKind,
    pub value: Option<f64>,
    pub unit: Unit,
}

impl AggregateResult {
    pub fn no_data(kind: MetricKind, unit: Unit) -> Self {
        Self {
            kind,
            value: None,
            unit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleEntry {
    pub value: f64,
    pub unit: Unit,
    pub recorded_at: DateTime<Utc>,
}

/// Entries are ordered by `recorded_at`, most recent first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleResult {
    pub kind: MetricKind,
    pub entries: Vec<SampleEntry>,
}

impl SampleResult {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What one metric slot of a snapshot holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricOutcome {
    Aggregate(AggregateResult),
    Samples(SampleResult),
    Failed { error: String },
}

impl MetricOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, MetricOutcome::Failed { .. })
    }
}
