use std::path::PathBuf;

/// Errors from local cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// I/O error from the underlying storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The cache directory could not be used.
    #[error("cache directory unusable: {path}: {reason}")]
    Directory { path: PathBuf, reason: String },

    /// Writing an entry failed after the temporary file was created.
    #[error("failed to persist cache entry {key}: {reason}")]
    Persist { key: String, reason: String },
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
