// Result of one aggregation cycle across all requested metrics

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::{AggregateResult, MetricKind, MetricOutcome, SampleResult, TimeWindow};

/// Immutable once built; the next cycle produces a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub window: TimeWindow,
    /// Metrics that were queried over their own window instead of `window`.
    pub window_overrides: BTreeMap<MetricKind, TimeWindow>,
    pub collected_at: DateTime<Utc>,
    pub results: BTreeMap<MetricKind, MetricOutcome>,
}

impl Snapshot {
    /// The window `kind`'s result actually covers.
    pub fn window_for(&self, kind: MetricKind) -> &TimeWindow {
        self.window_overrides.get(&kind).unwrap_or(&self.window)
    }

    pub fn get(&self, kind: MetricKind) -> Option<&MetricOutcome> {
        self.results.get(&kind)
    }

    pub fn aggregate(&self, kind: MetricKind) -> Option<&AggregateResult> {
        match self.results.get(&kind) {
            Some(MetricOutcome::Aggregate(r)) => Some(r),
            _ => None,
        }
    }

    pub fn samples(&self, kind: MetricKind) -> Option<&SampleResult> {
        match self.results.get(&kind) {
            Some(MetricOutcome::Samples(r)) => Some(r),
            _ => None,
        }
    }

    pub fn failed_count(&self) -> usize {
        self.results.values().filter(|o| o.is_failed()).count()
    }
}
