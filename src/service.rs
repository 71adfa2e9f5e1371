// Metric aggregation service: authorize, fan out one query per metric, join into a snapshot.

use futures_util::future::join_all;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::auth::{AuthStatus, AuthorizationGate};
use crate::cancel::CancelSignal;
use crate::error::CollectError;
use crate::models::{AggregationMode, MetricKind, MetricOutcome, Snapshot, TimeWindow};
use crate::provider::{HealthProvider, SampleQuery, Statistic};
use crate::query::{AggregationQueryRunner, SampleSeriesQueryRunner};
use crate::registry::{MetricRegistry, RegistryError};

/// Readings kept per sample-list metric unless configured otherwise.
pub const DEFAULT_SAMPLE_LIMIT: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Idle,
    Authorizing,
    Querying,
    Ready,
    Denied,
    Unavailable,
    Cancelled,
}

impl ServiceState {
    fn in_progress(self) -> bool {
        matches!(self, ServiceState::Authorizing | ServiceState::Querying)
    }
}

/// What one `collect` cycle should fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectRequest {
    pub window: TimeWindow,
    pub metrics: BTreeSet<MetricKind>,
    /// Metrics queried over their own window instead of `window`.
    pub window_overrides: BTreeMap<MetricKind, TimeWindow>,
    pub sample_limit: usize,
    /// Apply the window to sample-list queries too (unbounded otherwise).
    pub bound_sample_queries: bool,
}

impl CollectRequest {
    pub fn new(window: TimeWindow, metrics: impl IntoIterator<Item = MetricKind>) -> Self {
        Self {
            window,
            metrics: metrics.into_iter().collect(),
            window_overrides: BTreeMap::new(),
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            bound_sample_queries: false,
        }
    }

    pub fn with_window_for(mut self, kind: MetricKind, window: TimeWindow) -> Self {
        self.window_overrides.insert(kind, window);
        self
    }

    pub fn with_sample_limit(mut self, limit: usize) -> Self {
        self.sample_limit = limit;
        self
    }

    pub fn window_for(&self, kind: MetricKind) -> &TimeWindow {
        self.window_overrides.get(&kind).unwrap_or(&self.window)
    }
}

pub struct MetricAggregationService {
    registry: Arc<MetricRegistry>,
    gate: AuthorizationGate,
    aggregates: AggregationQueryRunner,
    samples: SampleSeriesQueryRunner,
    state_tx: watch::Sender<ServiceState>,
    // Cycles currently running; the final state is published by the last one out.
    in_flight: Mutex<usize>,
}

/// One running cycle. Dropped without `finish` (the caller dropped the
/// future), it counts as cancelled.
struct ActiveCycle<'a> {
    service: &'a MetricAggregationService,
    finished: bool,
}

impl ActiveCycle<'_> {
    fn finish(mut self, state: ServiceState) {
        self.finished = true;
        self.service.end_cycle(Some(state));
    }
}

impl Drop for ActiveCycle<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.service.end_cycle(None);
        }
    }
}

impl MetricAggregationService {
    /// Validates the standard registry against `provider` before accepting it.
    pub fn new(provider: Arc<dyn HealthProvider>) -> Result<Self, RegistryError> {
        let registry = MetricRegistry::standard().validate_against(provider.as_ref())?;
        Ok(Self::with_registry(provider, registry))
    }

    pub fn with_registry(provider: Arc<dyn HealthProvider>, registry: MetricRegistry) -> Self {
        let registry = Arc::new(registry);
        let (state_tx, _) = watch::channel(ServiceState::Idle);
        Self {
            gate: AuthorizationGate::new(provider.clone(), registry.clone()),
            aggregates: AggregationQueryRunner::new(provider.clone()),
            samples: SampleSeriesQueryRunner::new(provider),
            registry,
            state_tx,
            in_flight: Mutex::new(0),
        }
    }

    /// While any cycle is running this is the latest in-progress transition;
    /// once none are, it is the outcome of the last cycle to finish.
    pub fn state(&self) -> ServiceState {
        *self.state_tx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ServiceState> {
        self.state_tx.subscribe()
    }

    pub fn auth_status(&self) -> AuthStatus {
        self.gate.status()
    }

    /// Collects `metrics` over one shared window.
    pub async fn collect(
        &self,
        window: TimeWindow,
        metrics: impl IntoIterator<Item = MetricKind>,
        cancel: &CancelSignal,
    ) -> Result<Snapshot, CollectError> {
        self.collect_request(&CollectRequest::new(window, metrics), cancel)
            .await
    }

    /// Authorizes, then runs every metric query concurrently.
    ///
    /// Only unavailability, denial and cancellation fail the whole call; a
    /// failing metric is recorded as [`MetricOutcome::Failed`] in its slot.
    #[instrument(skip(self, request, cancel), fields(operation = "collect", metrics = request.metrics.len()))]
    pub async fn collect_request(
        &self,
        request: &CollectRequest,
        cancel: &CancelSignal,
    ) -> Result<Snapshot, CollectError> {
        let cycle = self.begin_cycle();
        let result = self.run_cycle(request, cancel).await;
        cycle.finish(match &result {
            Ok(_) => ServiceState::Ready,
            Err(CollectError::Unavailable) => ServiceState::Unavailable,
            Err(CollectError::AuthorizationDenied(_)) => ServiceState::Denied,
            Err(CollectError::Cancelled) => ServiceState::Cancelled,
        });
        result
    }

    async fn run_cycle(
        &self,
        request: &CollectRequest,
        cancel: &CancelSignal,
    ) -> Result<Snapshot, CollectError> {
        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        self.state_tx.send_replace(ServiceState::Authorizing);
        tokio::select! {
            r = self.gate.ensure_access(&request.metrics) => r?,
            _ = cancel.cancelled() => return Err(cancelled()),
        }

        self.state_tx.send_replace(ServiceState::Querying);
        let queries = request
            .metrics
            .iter()
            .map(|&kind| async move { (kind, self.query_metric(kind, request).await) });
        // Dropping the joined futures on cancel drops every in-flight provider query.
        let settled = tokio::select! {
            results = join_all(queries) => results,
            _ = cancel.cancelled() => return Err(cancelled()),
        };

        let snapshot = Snapshot {
            window: request.window,
            window_overrides: request
                .window_overrides
                .iter()
                .filter(|(kind, _)| request.metrics.contains(*kind))
                .map(|(kind, window)| (*kind, *window))
                .collect(),
            collected_at: chrono::Utc::now(),
            results: settled.into_iter().collect(),
        };
        info!(
            metrics = snapshot.results.len(),
            failed = snapshot.failed_count(),
            "collection cycle complete"
        );
        Ok(snapshot)
    }

    fn begin_cycle(&self) -> ActiveCycle<'_> {
        *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        ActiveCycle {
            service: self,
            finished: false,
        }
    }

    /// `outcome` is `None` when the cycle's future was dropped mid-flight.
    fn end_cycle(&self, outcome: Option<ServiceState>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        *in_flight = in_flight.saturating_sub(1);
        if *in_flight > 0 {
            return;
        }
        match outcome {
            Some(state) => {
                self.state_tx.send_replace(state);
            }
            None => {
                self.state_tx.send_if_modified(|state| {
                    let abandoned = state.in_progress();
                    if abandoned {
                        *state = ServiceState::Cancelled;
                    }
                    abandoned
                });
            }
        }
    }

    async fn query_metric(&self, kind: MetricKind, request: &CollectRequest) -> MetricOutcome {
        let Some(descriptor) = self.registry.get(kind) else {
            warn!(metric = %kind, "no descriptor registered");
            return MetricOutcome::Failed {
                error: format!("no descriptor registered for {}", kind),
            };
        };
        let window = request.window_for(kind);

        let result = match descriptor.aggregation_mode {
            AggregationMode::Sum => self
                .aggregates
                .run(descriptor, window, Statistic::Sum)
                .await
                .map(MetricOutcome::Aggregate),
            AggregationMode::Average => self
                .aggregates
                .run(descriptor, window, Statistic::Average)
                .await
                .map(MetricOutcome::Aggregate),
            AggregationMode::SampleList => {
                let query = SampleQuery {
                    window: request.bound_sample_queries.then_some(*window),
                    limit: request.sample_limit,
                    sort_descending: true,
                };
                self.samples
                    .run(descriptor, &query)
                    .await
                    .map(MetricOutcome::Samples)
            }
        };

        result.unwrap_or_else(|e| {
            warn!(metric = %kind, error = %e, operation = "query_metric", "metric query failed");
            MetricOutcome::Failed {
                error: e.to_string(),
            }
        })
    }

}

fn cancelled() -> CollectError {
    info!("collection cancelled");
    CollectError::Cancelled
}
