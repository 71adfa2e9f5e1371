// Scalar aggregate (sum / average) over a time window

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::models::{AggregateResult, TimeWindow};
use crate::provider::{HealthProvider, ProviderError, Statistic};
use crate::registry::MetricDescriptor;
use crate::units;

pub struct AggregationQueryRunner {
    provider: Arc<dyn HealthProvider>,
}

impl AggregationQueryRunner {
    pub fn new(provider: Arc<dyn HealthProvider>) -> Self {
        Self { provider }
    }

    /// Runs one statistics query and converts the result to `descriptor.display_unit`.
    ///
    /// An empty result set (or the provider's own "no data" error) yields
    /// `value: None`. Other provider failures are returned as errors.
    #[instrument(skip(self, descriptor, window), fields(metric = %descriptor.kind, operation = "aggregate_query"))]
    pub async fn run(
        &self,
        descriptor: &MetricDescriptor,
        window: &TimeWindow,
        statistic: Statistic,
    ) -> Result<AggregateResult, ProviderError> {
        let raw = match self
            .provider
            .run_aggregate_query(descriptor.provider_identifier, window, statistic)
            .await
        {
            Ok(Some(q)) => q,
            Ok(None) | Err(ProviderError::NoData { .. }) => {
                debug!("no samples in window");
                return Ok(AggregateResult::no_data(
                    descriptor.kind,
                    descriptor.display_unit,
                ));
            }
            Err(e) => return Err(e),
        };

        if !raw.value.is_finite() {
            return Err(ProviderError::InvalidResponse(format!(
                "non-finite {:?} for {}",
                statistic, descriptor.provider_identifier
            )));
        }
        if statistic == Statistic::Sum && raw.value < 0.0 {
            return Err(ProviderError::InvalidResponse(format!(
                "negative sum {} for {}",
                raw.value, descriptor.provider_identifier
            )));
        }

        let value = units::convert(raw.value, raw.unit, descriptor.display_unit)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        let value = descriptor
            .precision
            .map_or(value, |decimals| units::round_to(value, decimals));

        Ok(AggregateResult {
            kind: descriptor.kind,
            value: Some(value),
            unit: descriptor.display_unit,
        })
    }
}
