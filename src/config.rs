use chrono::{DateTime, TimeZone};
use serde::Deserialize;
use std::collections::BTreeSet;

use crate::models::{Inclusivity, MetricKind, TimeWindow, WindowError};
use crate::provider::AuthorizationPolicy;
use crate::service::{CollectRequest, DEFAULT_SAMPLE_LIMIT};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub collection: CollectionConfig,
    pub publishing: PublishingConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// JSON data set loaded into the in-memory provider.
    pub data_path: String,
    #[serde(default)]
    pub authorization: AuthorizationPolicy,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    /// Local midnight today up to now.
    #[default]
    StartOfDay,
    /// The last `window_days` days up to now.
    Trailing,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionConfig {
    pub interval_secs: u64,
    #[serde(default = "default_sample_limit")]
    pub sample_limit: usize,
    #[serde(default)]
    pub window: WindowKind,
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    #[serde(default)]
    pub inclusivity: Inclusivity,
    #[serde(default = "default_metrics")]
    pub metrics: Vec<MetricKind>,
    #[serde(default)]
    pub bound_sample_queries: bool,
    /// Per-metric windows (e.g. heart rate over the trailing week).
    #[serde(default)]
    pub overrides: Vec<WindowOverride>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowOverride {
    pub metric: MetricKind,
    pub window: WindowKind,
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    #[serde(default)]
    pub inclusivity: Inclusivity,
}

fn default_sample_limit() -> usize {
    DEFAULT_SAMPLE_LIMIT
}

/// Longest trailing window accepted in config (about ten years).
pub const MAX_WINDOW_DAYS: u32 = 3650;

fn default_window_days() -> u32 {
    7
}

fn default_metrics() -> Vec<MetricKind> {
    MetricKind::ALL.to_vec()
}

fn resolve_window<Tz: TimeZone>(
    kind: WindowKind,
    days: u32,
    inclusivity: Inclusivity,
    now: &DateTime<Tz>,
) -> Result<TimeWindow, WindowError> {
    match kind {
        WindowKind::StartOfDay => Ok(TimeWindow::since_start_of_day(now.clone(), inclusivity)),
        WindowKind::Trailing => {
            TimeWindow::trailing(now.with_timezone(&chrono::Utc), days, inclusivity)
        }
    }
}

impl CollectionConfig {
    /// Builds the request for a cycle starting at `now`.
    pub fn request_at<Tz: TimeZone>(
        &self,
        now: DateTime<Tz>,
    ) -> Result<CollectRequest, WindowError> {
        let window = resolve_window(self.window, self.window_days, self.inclusivity, &now)?;
        let mut request = CollectRequest::new(window, self.metrics.iter().copied())
            .with_sample_limit(self.sample_limit);
        request.bound_sample_queries = self.bound_sample_queries;
        for o in &self.overrides {
            request = request.with_window_for(
                o.metric,
                resolve_window(o.window, o.window_days, o.inclusivity, &now)?,
            );
        }
        Ok(request)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    /// Max number of snapshots kept in the broadcast channel for /ws/snapshots (slow clients may lag).
    pub broadcast_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often to log app stats (cycles, ws clients) at INFO level.
    pub stats_log_interval_secs: u64,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.provider.data_path.is_empty(),
            "provider.data_path must be non-empty"
        );
        let c = &self.collection;
        anyhow::ensure!(
            c.interval_secs > 0,
            "collection.interval_secs must be > 0, got {}",
            c.interval_secs
        );
        anyhow::ensure!(
            c.sample_limit > 0,
            "collection.sample_limit must be > 0, got {}",
            c.sample_limit
        );
        anyhow::ensure!(
            (1..=MAX_WINDOW_DAYS).contains(&c.window_days),
            "collection.window_days must be between 1 and {}, got {}",
            MAX_WINDOW_DAYS,
            c.window_days
        );
        anyhow::ensure!(
            !c.metrics.is_empty(),
            "collection.metrics must name at least one metric"
        );
        let mut seen = BTreeSet::new();
        for o in &c.overrides {
            anyhow::ensure!(
                seen.insert(o.metric),
                "collection.overrides has more than one entry for {}",
                o.metric
            );
            anyhow::ensure!(
                (1..=MAX_WINDOW_DAYS).contains(&o.window_days),
                "collection.overrides window_days for {} must be between 1 and {}, got {}",
                o.metric,
                MAX_WINDOW_DAYS,
                o.window_days
            );
        }
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}
