// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{Router, routing::get};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::{broadcast, watch};
use tower_http::cors::{Any, CorsLayer};

use crate::models::Snapshot;
use crate::service::MetricAggregationService;
use crate::worker::WorkerStats;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) snapshot_tx: broadcast::Sender<Arc<Snapshot>>,
    pub(crate) latest_rx: watch::Receiver<Option<Arc<Snapshot>>>,
    pub(crate) service: Arc<MetricAggregationService>,
    pub(crate) stats: Arc<WorkerStats>,
    pub(crate) ws_connections: Arc<AtomicUsize>,
}

pub fn app(
    snapshot_tx: broadcast::Sender<Arc<Snapshot>>,
    latest_rx: watch::Receiver<Option<Arc<Snapshot>>>,
    service: Arc<MetricAggregationService>,
    stats: Arc<WorkerStats>,
    ws_connections: Arc<AtomicUsize>,
) -> Router {
    let state = AppState {
        snapshot_tx,
        latest_rx,
        service,
        stats,
        ws_connections,
    };
    Router::new()
        .route("/", get(|| async { "healthmetrics: time-windowed health metrics" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/snapshot", get(http::snapshot_handler)) // GET /api/snapshot
        .route("/api/snapshot/display", get(http::display_handler)) // GET /api/snapshot/display
        .route("/api/status", get(http::status_handler)) // GET /api/status
        .route("/ws/snapshots", get(ws::ws_snapshots)) // WS /ws/snapshots
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
