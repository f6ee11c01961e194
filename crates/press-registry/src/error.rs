use std::time::Duration;

use press_types::InitError;

/// Errors produced by registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The null id cannot be registered.
    #[error("content id cannot be empty")]
    EmptyContentId,

    /// The chain endpoint is unreachable or refused the call.
    #[error("registry unavailable: {0}")]
    Unavailable(String),

    /// The transaction was submitted but not confirmed.
    #[error("transaction not confirmed: {0}")]
    NotConfirmed(String),

    /// A network call did not complete within the configured bound.
    #[error("registry {operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The endpoint serves a different chain than the one configured.
    #[error("wrong network: expected chain {expected}, connected to {actual}")]
    NetworkMismatch { expected: u64, actual: u64 },

    /// Connecting to the registry failed.
    #[error("registry initialization: {0}")]
    Init(#[from] InitError),

    /// Journal record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the journal.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
