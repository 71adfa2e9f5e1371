// Sample series runner tests: ordering, truncation, unit normalization, error mapping

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use healthmetrics::models::{MetricKind, TimeWindow};
use healthmetrics::provider::{
    AuthorizationResponse, HealthProvider, ProviderError, Quantity, RawSample, SampleQuery,
    Statistic,
};
use healthmetrics::query::SampleSeriesQueryRunner;
use healthmetrics::registry::MetricRegistry;
use healthmetrics::units::Unit;
use std::sync::{Arc, Mutex};

/// Returns a fixed response to every sample query, ignoring the limit and sort order.
struct ScriptedProvider {
    response: Result<Vec<RawSample>, ProviderError>,
    last_query: Mutex<Option<SampleQuery>>,
}

impl ScriptedProvider {
    fn new(response: Result<Vec<RawSample>, ProviderError>) -> Arc<Self> {
        Arc::new(Self {
            response,
            last_query: Mutex::new(None),
        })
    }
}

#[async_trait]
impl HealthProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn supports_type(&self, _type_id: &str) -> bool {
        true
    }

    async fn request_authorization(
        &self,
        _read_types: &[&str],
        _write_types: &[&str],
    ) -> Result<AuthorizationResponse, ProviderError> {
        Ok(AuthorizationResponse::Granted)
    }

    async fn run_aggregate_query(
        &self,
        _type_id: &str,
        _window: &TimeWindow,
        _statistic: Statistic,
    ) -> Result<Option<Quantity>, ProviderError> {
        Ok(None)
    }

    async fn run_sample_query(
        &self,
        _type_id: &str,
        query: &SampleQuery,
    ) -> Result<Vec<RawSample>, ProviderError> {
        *self.last_query.lock().unwrap() = Some(query.clone());
        self.response.clone()
    }
}

fn hour(h: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap() + Duration::hours(h)
}

fn reading(value: f64, unit: Unit, h: i64) -> RawSample {
    RawSample {
        value,
        unit,
        start: hour(h),
        end: hour(h),
    }
}

fn query(limit: usize, sort_descending: bool) -> SampleQuery {
    SampleQuery {
        window: None,
        limit,
        sort_descending,
    }
}

async fn run(
    provider: Arc<ScriptedProvider>,
    q: &SampleQuery,
) -> Result<healthmetrics::models::SampleResult, ProviderError> {
    let registry = MetricRegistry::standard();
    let descriptor = registry.get(MetricKind::BloodPressureSystolic).unwrap();
    SampleSeriesQueryRunner::new(provider).run(descriptor, q).await
}

#[tokio::test]
async fn unsorted_response_comes_back_newest_first() {
    let provider = ScriptedProvider::new(Ok(vec![
        reading(110.0, Unit::MillimeterOfMercury, 3),
        reading(130.0, Unit::MillimeterOfMercury, 9),
        reading(120.0, Unit::MillimeterOfMercury, 1),
        reading(125.0, Unit::MillimeterOfMercury, 5),
    ]));
    let result = run(provider, &query(7, true)).await.unwrap();
    assert_eq!(result.kind, MetricKind::BloodPressureSystolic);
    assert!(
        result
            .entries
            .windows(2)
            .all(|w| w[0].recorded_at >= w[1].recorded_at)
    );
    let values: Vec<f64> = result.entries.iter().map(|e| e.value).collect();
    assert_eq!(values, vec![130.0, 125.0, 110.0, 120.0]);
}

#[tokio::test]
async fn oversized_response_keeps_newest_readings() {
    let samples = (0..10)
        .map(|h| reading(100.0 + h as f64, Unit::MillimeterOfMercury, h))
        .collect();
    let provider = ScriptedProvider::new(Ok(samples));
    let result = run(provider.clone(), &query(3, true)).await.unwrap();
    let values: Vec<f64> = result.entries.iter().map(|e| e.value).collect();
    assert_eq!(values, vec![109.0, 108.0, 107.0]);
    let sent = provider.last_query.lock().unwrap().clone().unwrap();
    assert_eq!(sent.limit, 3);
    assert!(sent.sort_descending);
}

#[tokio::test]
async fn ascending_fetch_keeps_oldest_but_orders_newest_first() {
    let samples = (0..10)
        .map(|h| reading(100.0 + h as f64, Unit::MillimeterOfMercury, h))
        .collect();
    let provider = ScriptedProvider::new(Ok(samples));
    let result = run(provider, &query(3, false)).await.unwrap();
    let values: Vec<f64> = result.entries.iter().map(|e| e.value).collect();
    assert_eq!(values, vec![102.0, 101.0, 100.0]);
}

#[tokio::test]
async fn readings_are_normalized_to_display_unit() {
    let provider = ScriptedProvider::new(Ok(vec![reading(16.0, Unit::Kilopascal, 2)]));
    let result = run(provider, &query(7, true)).await.unwrap();
    let entry = &result.entries[0];
    assert_eq!(entry.unit, Unit::MillimeterOfMercury);
    assert!((entry.value - 120.009_852).abs() < 1e-3);
    assert_eq!(entry.recorded_at, hour(2));
}

#[tokio::test]
async fn zero_results_is_empty_not_error() {
    let provider = ScriptedProvider::new(Ok(vec![]));
    let result = run(provider, &query(7, true)).await.unwrap();
    assert!(result.entries.is_empty());

    let provider = ScriptedProvider::new(Err(ProviderError::NoData {
        type_id: "blood_pressure_systolic".into(),
    }));
    let result = run(provider, &query(7, true)).await.unwrap();
    assert!(result.entries.is_empty());
}

#[tokio::test]
async fn provider_failure_is_returned() {
    let provider = ScriptedProvider::new(Err(ProviderError::Internal("store corrupted".into())));
    let err = run(provider, &query(7, true)).await.unwrap_err();
    assert_eq!(err, ProviderError::Internal("store corrupted".into()));
}

#[tokio::test]
async fn incompatible_unit_is_invalid_response() {
    let provider = ScriptedProvider::new(Ok(vec![reading(3.0, Unit::Mile, 2)]));
    let err = run(provider, &query(7, true)).await.unwrap_err();
    assert!(matches!(err, ProviderError::InvalidResponse(_)));
}
