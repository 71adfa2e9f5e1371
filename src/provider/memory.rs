// In-memory health data store: demo backend and test double.
// Holds quantity samples, evaluates window predicates, sums/averages in each type's native unit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;
use tracing::debug;

use super::{
    AuthorizationResponse, HealthProvider, ProviderError, Quantity, RawSample, SampleQuery,
    Statistic,
};
use crate::models::TimeWindow;
use crate::registry::ids;
use crate::units::{self, Unit};

/// How the store answers authorization prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationPolicy {
    #[default]
    Grant,
    Deny,
}

/// One stored reading. `end` defaults to `start` for instantaneous samples.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoredSample {
    #[serde(rename = "type")]
    pub type_id: String,
    pub value: f64,
    pub unit: Unit,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl StoredSample {
    pub fn new(
        type_id: &str,
        value: f64,
        unit: Unit,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            type_id: type_id.to_string(),
            value,
            unit,
            start,
            end: Some(end),
        }
    }

    pub fn instant(type_id: &str, value: f64, unit: Unit, at: DateTime<Utc>) -> Self {
        Self::new(type_id, value, unit, at, at)
    }

    fn end(&self) -> DateTime<Utc> {
        self.end.unwrap_or(self.start)
    }
}

/// JSON data file: `{ "samples": [ { "type", "value", "unit", "start", "end" } ] }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataSet {
    #[serde(default)]
    pub samples: Vec<StoredSample>,
}

/// Native unit per type: what the store reports aggregates in.
fn default_native_units() -> HashMap<String, Unit> {
    HashMap::from([
        (ids::STEP_COUNT.to_string(), Unit::Count),
        (ids::DISTANCE_WALKING_RUNNING.to_string(), Unit::Mile),
        (ids::HEART_RATE.to_string(), Unit::CountPerMinute),
        (
            ids::BLOOD_PRESSURE_SYSTOLIC.to_string(),
            Unit::MillimeterOfMercury,
        ),
    ])
}

pub struct MemoryProvider {
    available: AtomicBool,
    policy: RwLock<AuthorizationPolicy>,
    native_units: HashMap<String, Unit>,
    samples: RwLock<Vec<StoredSample>>,
    failures: Mutex<HashMap<String, ProviderError>>,
    latency_ms: AtomicU64,
    prompts: AtomicUsize,
    aggregate_queries: AtomicUsize,
    sample_queries: AtomicUsize,
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::with_samples(Vec::new())
    }

    pub fn with_samples(samples: Vec<StoredSample>) -> Self {
        Self {
            available: AtomicBool::new(true),
            policy: RwLock::new(AuthorizationPolicy::Grant),
            native_units: default_native_units(),
            samples: RwLock::new(samples),
            failures: Mutex::new(HashMap::new()),
            latency_ms: AtomicU64::new(0),
            prompts: AtomicUsize::new(0),
            aggregate_queries: AtomicUsize::new(0),
            sample_queries: AtomicUsize::new(0),
        }
    }

    /// Loads a JSON [`DataSet`] from disk.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("read data set {}: {}", path.display(), e))?;
        Self::load_from_str(&s)
    }

    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let data: DataSet = serde_json::from_str(s)?;
        let provider = Self::with_samples(Vec::new());
        for sample in &data.samples {
            let native = provider
                .native_units
                .get(&sample.type_id)
                .ok_or_else(|| anyhow::anyhow!("unknown sample type {:?}", sample.type_id))?;
            units::convert(sample.value, sample.unit, *native).map_err(|e| {
                anyhow::anyhow!("sample of type {:?}: {}", sample.type_id, e)
            })?;
            anyhow::ensure!(
                sample.end() >= sample.start,
                "sample of type {:?} ends before it starts",
                sample.type_id
            );
        }
        provider.extend(data.samples);
        Ok(provider)
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    pub fn set_authorization_policy(&self, policy: AuthorizationPolicy) {
        *self.policy.write().unwrap_or_else(PoisonError::into_inner) = policy;
    }

    pub fn push(&self, sample: StoredSample) {
        self.extend(std::iter::once(sample));
    }

    pub fn extend(&self, samples: impl IntoIterator<Item = StoredSample>) {
        self.samples
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(samples);
    }

    /// Every query for `type_id` fails with `error` until cleared.
    pub fn fail_type(&self, type_id: &str, error: ProviderError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(type_id.to_string(), error);
    }

    pub fn clear_failures(&self) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Delay applied before answering each query.
    pub fn set_latency(&self, latency: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(ms, Ordering::Relaxed);
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::Relaxed)
    }

    pub fn aggregate_query_count(&self) -> usize {
        self.aggregate_queries.load(Ordering::Relaxed)
    }

    pub fn sample_query_count(&self) -> usize {
        self.sample_queries.load(Ordering::Relaxed)
    }

    pub fn query_count(&self) -> usize {
        self.aggregate_query_count() + self.sample_query_count()
    }

    async fn simulate_latency(&self) {
        let ms = self.latency_ms.load(Ordering::Relaxed);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn check_query(&self, type_id: &str) -> Result<Unit, ProviderError> {
        if !self.is_available() {
            return Err(ProviderError::Unavailable);
        }
        let failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(err) = failures.get(type_id) {
            return Err(err.clone());
        }
        self.native_units
            .get(type_id)
            .copied()
            .ok_or_else(|| ProviderError::Unsupported(type_id.to_string()))
    }
}

#[async_trait]
impl HealthProvider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    fn supports_type(&self, type_id: &str) -> bool {
        self.native_units.contains_key(type_id)
    }

    async fn request_authorization(
        &self,
        read_types: &[&str],
        write_types: &[&str],
    ) -> Result<AuthorizationResponse, ProviderError> {
        if !self.is_available() {
            return Err(ProviderError::Unavailable);
        }
        if let Some(unsupported) = read_types
            .iter()
            .chain(write_types)
            .find(|t| !self.supports_type(t))
        {
            return Err(ProviderError::Unsupported(unsupported.to_string()));
        }
        self.prompts.fetch_add(1, Ordering::Relaxed);
        debug!(
            read_types = read_types.len(),
            write_types = write_types.len(),
            "authorization prompt"
        );
        let policy = *self.policy.read().unwrap_or_else(PoisonError::into_inner);
        Ok(match policy {
            AuthorizationPolicy::Grant => AuthorizationResponse::Granted,
            AuthorizationPolicy::Deny => AuthorizationResponse::Denied {
                reason: "user declined access to health data".into(),
            },
        })
    }

    async fn run_aggregate_query(
        &self,
        type_id: &str,
        window: &TimeWindow,
        statistic: Statistic,
    ) -> Result<Option<Quantity>, ProviderError> {
        self.aggregate_queries.fetch_add(1, Ordering::Relaxed);
        self.simulate_latency().await;
        let native = self.check_query(type_id)?;

        let values: Vec<f64> = {
            let samples = self.samples.read().unwrap_or_else(PoisonError::into_inner);
            samples
                .iter()
                .filter(|s| s.type_id == type_id && window.matches(s.start, s.end()))
                .map(|s| units::convert(s.value, s.unit, native))
                .collect::<Result<_, _>>()
                .map_err(|e| ProviderError::Internal(e.to_string()))?
        };
        if values.is_empty() {
            return Ok(None);
        }
        let sum: f64 = values.iter().sum();
        let value = match statistic {
            Statistic::Sum => sum,
            Statistic::Average => sum / values.len() as f64,
        };
        Ok(Some(Quantity {
            value,
            unit: native,
        }))
    }

    async fn run_sample_query(
        &self,
        type_id: &str,
        query: &SampleQuery,
    ) -> Result<Vec<RawSample>, ProviderError> {
        self.sample_queries.fetch_add(1, Ordering::Relaxed);
        self.simulate_latency().await;
        self.check_query(type_id)?;

        let samples = self.samples.read().unwrap_or_else(PoisonError::into_inner);
        let mut matched: Vec<RawSample> = samples
            .iter()
            .filter(|s| s.type_id == type_id)
            .filter(|s| query.window.is_none_or(|w| w.matches(s.start, s.end())))
            .map(|s| RawSample {
                value: s.value,
                unit: s.unit,
                start: s.start,
                end: s.end(),
            })
            .collect();
        // Ordered by start date, the instant reported as a reading's `recorded_at`.
        if query.sort_descending {
            matched.sort_by(|a, b| b.start.cmp(&a.start));
        } else {
            matched.sort_by(|a, b| a.start.cmp(&b.start));
        }
        matched.truncate(query.limit);
        Ok(matched)
    }
}
