// Fatal outcomes of a collection cycle. Per-metric failures live in the snapshot instead.

use crate::provider::ProviderError;

/// Why access to the provider could not be established.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("health data is not available on this host")]
    Unavailable,
    #[error("authorization denied: {reason}")]
    Denied { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectError {
    #[error("health data is not available on this host")]
    Unavailable,
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),
    #[error("collection cancelled")]
    Cancelled,
}

impl From<AccessError> for CollectError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::Unavailable => CollectError::Unavailable,
            AccessError::Denied { reason } => CollectError::AuthorizationDenied(reason),
        }
    }
}

impl From<ProviderError> for AccessError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Unavailable => AccessError::Unavailable,
            other => AccessError::Denied {
                reason: other.to_string(),
            },
        }
    }
}
