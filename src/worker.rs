// Background collection worker: runs one aggregation cycle per tick and publishes the snapshot.
// Subscribers get every snapshot over broadcast; pollers read the latest from a watch.
// Fatal outcomes are retried on the next tick.

use crate::cancel::CancelSignal;
use crate::config::CollectionConfig;
use crate::error::CollectError;
use crate::models::Snapshot;
use crate::service::MetricAggregationService;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{broadcast, watch};
use tokio::time::{Duration, Instant, interval};
use tracing::instrument;

/// Rate limit for "no receivers" log (avoid logging every cycle when no one is on /ws/snapshots)
const NO_RECEIVERS_WARN_INTERVAL: Duration = Duration::from_secs(60);

/// Cycle counters shared with the HTTP status route.
#[derive(Debug, Default)]
pub struct WorkerStats {
    pub cycles_completed: AtomicU64,
    pub cycles_failed: AtomicU64,
}

/// Service, channels, and shutdown for the worker.
pub struct WorkerDeps {
    pub service: Arc<MetricAggregationService>,
    pub tx: broadcast::Sender<Arc<Snapshot>>,
    pub latest_tx: watch::Sender<Option<Arc<Snapshot>>>,
    pub ws_connections: Arc<AtomicUsize>,
    pub stats: Arc<WorkerStats>,
    pub shutdown: CancelSignal,
}

/// Worker timing and what to collect.
pub struct WorkerConfig {
    pub interval_secs: u64,
    /// How often to log app stats (real seconds).
    pub stats_log_interval_secs: u64,
    pub collection: CollectionConfig,
}

pub fn spawn(deps: WorkerDeps, config: WorkerConfig) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(deps, config).await;
    })
}

#[instrument(skip_all, fields(interval_secs = config.interval_secs))]
async fn run(deps: WorkerDeps, config: WorkerConfig) {
    let WorkerDeps {
        service,
        tx,
        latest_tx,
        ws_connections,
        stats,
        shutdown,
    } = deps;

    let mut tick = interval(Duration::from_secs(config.interval_secs));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut stats_log_tick = interval(Duration::from_secs(config.stats_log_interval_secs));
    stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut last_no_receivers_warn: Option<Instant> = None;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let request = match config.collection.request_at(chrono::Local::now()) {
                    Ok(r) => r,
                    Err(e) => {
                        stats.cycles_failed.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(
                            error = %e,
                            operation = "build_request",
                            "could not compute collection window; retrying next tick"
                        );
                        continue;
                    }
                };
                let snapshot = match service.collect_request(&request, &shutdown).await {
                    Ok(s) => Arc::new(s),
                    Err(CollectError::Cancelled) => {
                        tracing::debug!("Worker cycle cancelled by shutdown");
                        break;
                    }
                    Err(e) => {
                        stats.cycles_failed.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(
                            error = %e,
                            operation = "collect",
                            "collection cycle failed; retrying next tick"
                        );
                        continue;
                    }
                };
                stats.cycles_completed.fetch_add(1, Ordering::Relaxed);

                latest_tx.send_replace(Some(snapshot.clone()));
                if tx.send(snapshot).is_err() {
                    let should_warn = last_no_receivers_warn
                        .is_none_or(|t| t.elapsed() >= NO_RECEIVERS_WARN_INTERVAL);
                    if should_warn {
                        tracing::debug!(
                            operation = "broadcast_snapshot",
                            "No active WebSocket clients; broadcast channel has no receivers"
                        );
                        last_no_receivers_warn = Some(Instant::now());
                    }
                }
            }
            _ = shutdown.cancelled() => {
                tracing::debug!("Worker shutting down");
                break;
            }
            _ = stats_log_tick.tick() => {
                tracing::info!(
                    ws_snapshot_clients = ws_connections.load(Ordering::Relaxed),
                    cycles_completed = stats.cycles_completed.load(Ordering::Relaxed),
                    cycles_failed = stats.cycles_failed.load(Ordering::Relaxed),
                    service_state = ?service.state(),
                    auth_status = ?service.auth_status(),
                    "app stats"
                );
            }
        }
    }
}
