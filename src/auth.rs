// Authorization gate: one-time permission negotiation with the provider.
// Only the gate writes the authorization status; everything else reads it.

use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

use crate::error::AccessError;
use crate::models::MetricKind;
use crate::provider::{AuthorizationResponse, HealthProvider};
use crate::registry::MetricRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    NotRequested,
    Granted,
    Denied,
}

struct Grant {
    status: AuthStatus,
    kinds: BTreeSet<MetricKind>,
}

pub struct AuthorizationGate {
    provider: Arc<dyn HealthProvider>,
    registry: Arc<MetricRegistry>,
    // Held across the prompt so concurrent callers never prompt twice.
    grant: Mutex<Grant>,
    status_tx: watch::Sender<AuthStatus>,
}

impl AuthorizationGate {
    pub fn new(provider: Arc<dyn HealthProvider>, registry: Arc<MetricRegistry>) -> Self {
        let (status_tx, _) = watch::channel(AuthStatus::NotRequested);
        Self {
            provider,
            registry,
            grant: Mutex::new(Grant {
                status: AuthStatus::NotRequested,
                kinds: BTreeSet::new(),
            }),
            status_tx,
        }
    }

    pub fn status(&self) -> AuthStatus {
        *self.status_tx.borrow()
    }

    /// Returns immediately once `required` has been granted; otherwise prompts.
    /// A previous denial is re-attempted.
    #[instrument(skip(self, required), fields(operation = "ensure_access", kinds = required.len()))]
    pub async fn ensure_access(&self, required: &BTreeSet<MetricKind>) -> Result<(), AccessError> {
        if !self.provider.is_available() {
            warn!(provider = self.provider.name(), "health data unavailable");
            return Err(AccessError::Unavailable);
        }

        let mut grant = self.grant.lock().await;
        if grant.status == AuthStatus::Granted && required.is_subset(&grant.kinds) {
            debug!("access already granted");
            return Ok(());
        }

        let requesting: BTreeSet<MetricKind> = grant.kinds.union(required).copied().collect();
        let read_types: Vec<&str> = requesting
            .iter()
            .filter_map(|k| self.registry.get(*k))
            .map(|d| d.provider_identifier)
            .collect();

        let response = self.provider.request_authorization(&read_types, &[]).await;
        match response {
            Ok(AuthorizationResponse::Granted) => {
                info!(kinds = requesting.len(), "authorization granted");
                grant.kinds = requesting;
                self.set_status(&mut grant, AuthStatus::Granted);
                Ok(())
            }
            Ok(AuthorizationResponse::Denied { reason }) => {
                warn!(%reason, "authorization denied");
                grant.kinds.clear();
                self.set_status(&mut grant, AuthStatus::Denied);
                Err(AccessError::Denied { reason })
            }
            Err(e) => {
                let err = AccessError::from(e);
                warn!(error = %err, "authorization request failed");
                if err != AccessError::Unavailable {
                    grant.kinds.clear();
                    self.set_status(&mut grant, AuthStatus::Denied);
                }
                Err(err)
            }
        }
    }

    fn set_status(&self, grant: &mut Grant, status: AuthStatus) {
        grant.status = status;
        self.status_tx.send_replace(status);
    }
}
