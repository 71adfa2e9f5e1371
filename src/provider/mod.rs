// Health data provider seam: the only external boundary the client talks to

mod memory;

pub use memory::{AuthorizationPolicy, DataSet, MemoryProvider, StoredSample};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::TimeWindow;
use crate::units::Unit;

/// Statistic computed by an aggregate query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Sum,
    Average,
}

/// A scalar in the provider's own unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: Unit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    pub value: f64,
    pub unit: Unit,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Bounded fetch of raw samples. `window: None` means no time predicate.
/// `sort_descending` selects the newest (`true`) or oldest `limit` samples,
/// ordered by sample start (the reading's `recorded_at`).
#[derive(Debug, Clone, PartialEq)]
pub struct SampleQuery {
    pub window: Option<TimeWindow>,
    pub limit: usize,
    pub sort_descending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationResponse {
    Granted,
    Denied { reason: String },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("no data for {type_id}")]
    NoData { type_id: String },
    #[error("health data is not available on this host")]
    Unavailable,
    #[error("unsupported type identifier: {0}")]
    Unsupported(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider internal error: {0}")]
    Internal(String),
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Platform health data store.
///
/// Implementations must be `Send + Sync`: one handle is shared read-only by
/// every concurrent query of a collection cycle. Queries never mutate
/// provider state.
#[async_trait]
pub trait HealthProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// False when the host has no health data store at all.
    fn is_available(&self) -> bool;

    /// Whether `type_id` is a type this provider can query.
    fn supports_type(&self, type_id: &str) -> bool;

    /// One-time permission negotiation; may prompt the user.
    async fn request_authorization(
        &self,
        read_types: &[&str],
        write_types: &[&str],
    ) -> Result<AuthorizationResponse, ProviderError>;

    /// `Ok(None)` when no samples match the window.
    async fn run_aggregate_query(
        &self,
        type_id: &str,
        window: &TimeWindow,
        statistic: Statistic,
    ) -> Result<Option<Quantity>, ProviderError>;

    async fn run_sample_query(
        &self,
        type_id: &str,
        query: &SampleQuery,
    ) -> Result<Vec<RawSample>, ProviderError>;
}
