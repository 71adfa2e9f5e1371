// Static metric registry: provider type identifier, aggregation mode and display unit per metric.
// Built once and validated against the provider before any query runs.

use std::collections::BTreeMap;

use crate::models::{AggregationMode, MetricKind};
use crate::provider::HealthProvider;
use crate::units::Unit;

/// Provider type identifiers.
pub mod ids {
    pub const STEP_COUNT: &str = "step_count";
    pub const DISTANCE_WALKING_RUNNING: &str = "distance_walking_running";
    pub const HEART_RATE: &str = "heart_rate";
    pub const BLOOD_PRESSURE_SYSTOLIC: &str = "blood_pressure_systolic";
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricDescriptor {
    pub kind: MetricKind,
    pub provider_identifier: &'static str,
    pub aggregation_mode: AggregationMode,
    pub display_unit: Unit,
    /// Decimal places kept after conversion; `None` keeps full precision.
    pub precision: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("provider {provider} does not support {identifier} (required by {kind})")]
    Unsupported {
        provider: String,
        kind: MetricKind,
        identifier: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct MetricRegistry {
    descriptors: BTreeMap<MetricKind, MetricDescriptor>,
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl MetricRegistry {
    /// One descriptor for every [`MetricKind`].
    pub fn standard() -> Self {
        let descriptors = [
            MetricDescriptor {
                kind: MetricKind::StepCount,
                provider_identifier: ids::STEP_COUNT,
                aggregation_mode: AggregationMode::Sum,
                display_unit: Unit::Count,
                precision: None,
            },
            MetricDescriptor {
                kind: MetricKind::WalkingRunningDistance,
                provider_identifier: ids::DISTANCE_WALKING_RUNNING,
                aggregation_mode: AggregationMode::Sum,
                display_unit: Unit::Kilometer,
                precision: Some(2),
            },
            MetricDescriptor {
                kind: MetricKind::HeartRate,
                provider_identifier: ids::HEART_RATE,
                aggregation_mode: AggregationMode::Average,
                display_unit: Unit::CountPerMinute,
                precision: None,
            },
            MetricDescriptor {
                kind: MetricKind::BloodPressureSystolic,
                provider_identifier: ids::BLOOD_PRESSURE_SYSTOLIC,
                aggregation_mode: AggregationMode::SampleList,
                display_unit: Unit::MillimeterOfMercury,
                precision: None,
            },
        ];
        Self {
            descriptors: descriptors.into_iter().map(|d| (d.kind, d)).collect(),
        }
    }

    /// Fails on the first identifier the provider cannot query.
    pub fn validate_against(self, provider: &dyn HealthProvider) -> Result<Self, RegistryError> {
        if let Some(d) = self
            .descriptors
            .values()
            .find(|d| !provider.supports_type(d.provider_identifier))
        {
            return Err(RegistryError::Unsupported {
                provider: provider.name().to_string(),
                kind: d.kind,
                identifier: d.provider_identifier,
            });
        }
        Ok(self)
    }

    pub fn get(&self, kind: MetricKind) -> Option<&MetricDescriptor> {
        self.descriptors.get(&kind)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &MetricDescriptor> {
        self.descriptors.values()
    }
}
