use anyhow::Result;
use healthmetrics::*;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::{broadcast, watch};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let store = provider::MemoryProvider::load(&app_config.provider.data_path)?;
    store.set_authorization_policy(app_config.provider.authorization);
    store.set_available(app_config.provider.available);
    let health_provider: Arc<dyn provider::HealthProvider> = Arc::new(store);

    let aggregation_service = Arc::new(
        service::MetricAggregationService::new(health_provider)
            .map_err(|e| anyhow::anyhow!("metric registry: {}", e))?,
    );

    let (tx, _) = broadcast::channel(app_config.publishing.broadcast_capacity);
    let (latest_tx, latest_rx) = watch::channel(None);
    let ws_connections = Arc::new(AtomicUsize::new(0));
    let stats = Arc::new(worker::WorkerStats::default());
    let (shutdown, shutdown_signal) = cancel::cancel_pair();

    let worker_handle = worker::spawn(
        worker::WorkerDeps {
            service: aggregation_service.clone(),
            tx: tx.clone(),
            latest_tx,
            ws_connections: ws_connections.clone(),
            stats: stats.clone(),
            shutdown: shutdown_signal,
        },
        worker::WorkerConfig {
            interval_secs: app_config.collection.interval_secs,
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
            collection: app_config.collection.clone(),
        },
    );

    let app = routes::app(tx, latest_rx, aggregation_service, stats, ws_connections);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(_) => {
                        let _ = tokio::signal::ctrl_c().await;
                        return;
                    }
                };
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            #[cfg(not(unix))]
            {
                let _ = tokio::signal::ctrl_c().await;
            }
        } => {
            tracing::info!("Received shutdown signal");
            shutdown.cancel();
            let _ = worker_handle.await;
        }
    }

    Ok(())
}
