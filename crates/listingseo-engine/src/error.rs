use listingseo_core::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// Failure of an outbound provider call. Callers degrade to a fallback; these
/// never reach the end user.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned status {status}")]
    Status { provider: &'static str, status: u16 },

    #[error("{provider} API error: {message}")]
    Api {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} call timed out after {secs}s")]
    Timeout { provider: &'static str, secs: u64 },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Fatal failure of one workflow run. The analysis is left `failed`.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("analysis {0} not found")]
    NotFound(Uuid),

    #[error("analysis {0} changed status while scanning")]
    StatusConflict(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("workflow queue is full")]
    Full,

    #[error("workflow queue is closed")]
    Closed,
}
