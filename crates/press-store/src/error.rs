use std::time::Duration;

use press_types::{ContentId, InitError};

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No payload is retrievable for the id.
    #[error("content not found: {0}")]
    NotFound(ContentId),

    /// Payload hash does not match the id it was read under (data corruption).
    #[error("hash mismatch for {id}: computed {computed}")]
    HashMismatch { id: ContentId, computed: ContentId },

    /// The backend is unreachable or refused the request.
    #[error("content store unavailable: {0}")]
    Unavailable(String),

    /// A network call did not complete within the configured bound.
    #[error("content store {operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Connecting to the backend failed.
    #[error("content store initialization: {0}")]
    Init(#[from] InitError),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` if the payload is simply absent rather than unreachable.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
