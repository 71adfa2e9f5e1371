// GET handlers: version, latest snapshot (raw and rendered), service status

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::atomic::Ordering;

use super::AppState;
use crate::display;
use crate::version::{NAME, VERSION};

fn no_snapshot_yet() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        axum::Json(serde_json::json!({ "error": "no snapshot collected yet" })),
    )
        .into_response()
}

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/snapshot — latest snapshot as JSON; 503 until the first cycle completes.
pub(super) async fn snapshot_handler(State(state): State<AppState>) -> Response {
    let latest = state.latest_rx.borrow().clone();
    match latest {
        Some(snapshot) => axum::Json(snapshot.as_ref().clone()).into_response(),
        None => no_snapshot_yet(),
    }
}

/// GET /api/snapshot/display — latest snapshot rendered to display text per metric.
pub(super) async fn display_handler(State(state): State<AppState>) -> Response {
    let latest = state.latest_rx.borrow().clone();
    match latest {
        Some(snapshot) => axum::Json(serde_json::json!({
            "collectedAt": snapshot.collected_at,
            "metrics": display::render_snapshot(&snapshot),
        }))
        .into_response(),
        None => no_snapshot_yet(),
    }
}

/// GET /api/status — service state machine, authorization status and cycle counters.
pub(super) async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let last_collected_at = state
        .latest_rx
        .borrow()
        .as_ref()
        .map(|s| s.collected_at);
    axum::Json(serde_json::json!({
        "state": state.service.state(),
        "authorization": state.service.auth_status(),
        "cyclesCompleted": state.stats.cycles_completed.load(Ordering::Relaxed),
        "cyclesFailed": state.stats.cycles_failed.load(Ordering::Relaxed),
        "wsClients": state.ws_connections.load(Ordering::Relaxed),
        "lastCollectedAt": last_collected_at,
    }))
}
