// Bounded series of raw readings, newest first

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::models::{SampleEntry, SampleResult};
use crate::provider::{HealthProvider, ProviderError, SampleQuery};
use crate::registry::MetricDescriptor;
use crate::units;

pub struct SampleSeriesQueryRunner {
    provider: Arc<dyn HealthProvider>,
}

impl SampleSeriesQueryRunner {
    pub fn new(provider: Arc<dyn HealthProvider>) -> Self {
        Self { provider }
    }

    /// Entries come back ordered by `recorded_at` descending and hold at most
    /// `query.limit` readings, whatever order or count the provider returned.
    #[instrument(skip(self, descriptor, query), fields(metric = %descriptor.kind, operation = "sample_query", limit = query.limit))]
    pub async fn run(
        &self,
        descriptor: &MetricDescriptor,
        query: &SampleQuery,
    ) -> Result<SampleResult, ProviderError> {
        let raw = match self
            .provider
            .run_sample_query(descriptor.provider_identifier, query)
            .await
        {
            Ok(raw) => raw,
            Err(ProviderError::NoData { .. }) => Vec::new(),
            Err(e) => return Err(e),
        };

        let mut entries = raw
            .into_iter()
            .map(|s| {
                if !s.value.is_finite() {
                    return Err(ProviderError::InvalidResponse(format!(
                        "non-finite sample for {}",
                        descriptor.provider_identifier
                    )));
                }
                let value = units::convert(s.value, s.unit, descriptor.display_unit)
                    .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
                Ok(SampleEntry {
                    value: descriptor
                        .precision
                        .map_or(value, |decimals| units::round_to(value, decimals)),
                    unit: descriptor.display_unit,
                    recorded_at: s.start,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Oldest first, keep the requested end of history, then flip.
        entries.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at));
        if entries.len() > query.limit {
            if query.sort_descending {
                let excess = entries.len() - query.limit;
                entries.drain(..excess);
            } else {
                entries.truncate(query.limit);
            }
        }
        entries.reverse();

        debug!(entries = entries.len(), "samples fetched");
        Ok(SampleResult {
            kind: descriptor.kind,
            entries,
        })
    }
}
