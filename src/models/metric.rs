// Metric kinds and how each one is aggregated

use serde::{Deserialize, Serialize};
use std::fmt;

/// Physiological measurements this client understands; serializes to snake_case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    StepCount,
    WalkingRunningDistance,
    HeartRate,
    BloodPressureSystolic,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::StepCount,
        MetricKind::WalkingRunningDistance,
        MetricKind::HeartRate,
        MetricKind::BloodPressureSystolic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::StepCount => "step_count",
            MetricKind::WalkingRunningDistance => "walking_running_distance",
            MetricKind::HeartRate => "heart_rate",
            MetricKind::BloodPressureSystolic => "blood_pressure_systolic",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// Cumulative sum over the window (steps, distance).
    Sum,
    /// Discrete average over the window (heart rate).
    Average,
    /// Bounded list of raw readings (blood pressure).
    SampleList,
}
