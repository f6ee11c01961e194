use press_cache::CacheError;
use press_registry::RegistryError;
use press_store::StoreError;
use press_types::{ContentId, TypeError};
use press_wallet::WalletError;
use thiserror::Error;

/// Coarse category of an [`ArticleError`], for callers that branch on the
/// failure class rather than the exact cause.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidDraft,
    StoreUnavailable,
    RegistrationFailed,
    ArticleUnavailable,
    FeedDegraded,
    RegistryUnavailable,
    WalletRejected,
    NetworkMismatch,
    Wallet,
    Serialization,
    LocalCache,
    Config,
}

#[derive(Debug, Error)]
pub enum ArticleError {
    #[error("invalid article: {0}")]
    InvalidDraft(#[source] TypeError),

    #[error("failed to encode article: {0}")]
    Serialization(#[source] TypeError),

    #[error("content store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    /// Content was stored under `cid` but the registry append failed.
    #[error("registration of {cid} failed: {source}")]
    RegistrationFailed {
        cid: ContentId,
        #[source]
        source: RegistryError,
    },

    #[error("article {cid} unavailable: {source}")]
    ArticleUnavailable {
        cid: ContentId,
        #[source]
        source: StoreError,
    },

    #[error("article {cid} could not be decoded: {source}")]
    Undecodable {
        cid: ContentId,
        #[source]
        source: TypeError,
    },

    /// The registry listed articles but none could be retrieved.
    #[error("feed degraded: {listed} articles listed, none retrievable")]
    FeedDegraded { listed: usize },

    #[error("registry unavailable: {0}")]
    RegistryUnavailable(#[source] RegistryError),

    #[error("wallet request rejected by user")]
    WalletRejected,

    #[error("wrong network: expected {expected}, wallet is on chain {actual}")]
    NetworkMismatch { expected: String, actual: u64 },

    #[error("wallet error: {0}")]
    Wallet(#[source] WalletError),

    #[error("local cache error: {0}")]
    Cache(#[source] CacheError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ArticleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDraft(_) => ErrorKind::InvalidDraft,
            Self::Serialization(_) | Self::Undecodable { .. } => ErrorKind::Serialization,
            Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            Self::RegistrationFailed { .. } => ErrorKind::RegistrationFailed,
            Self::ArticleUnavailable { .. } => ErrorKind::ArticleUnavailable,
            Self::FeedDegraded { .. } => ErrorKind::FeedDegraded,
            Self::RegistryUnavailable(_) => ErrorKind::RegistryUnavailable,
            Self::WalletRejected => ErrorKind::WalletRejected,
            Self::NetworkMismatch { .. } => ErrorKind::NetworkMismatch,
            Self::Wallet(_) => ErrorKind::Wallet,
            Self::Cache(_) => ErrorKind::LocalCache,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// The content id the failure concerns, when one is known.
    ///
    /// For [`RegistrationFailed`](Self::RegistrationFailed) this is the id to
    /// pass to `retry_registration` without uploading again.
    pub fn content_id(&self) -> Option<ContentId> {
        match self {
            Self::RegistrationFailed { cid, .. }
            | Self::ArticleUnavailable { cid, .. }
            | Self::Undecodable { cid, .. } => Some(*cid),
            _ => None,
        }
    }
}

impl From<WalletError> for ArticleError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::UserRejected => Self::WalletRejected,
            WalletError::NetworkMismatch {
                expected, actual, ..
            } => Self::NetworkMismatch { expected, actual },
            other => Self::Wallet(other),
        }
    }
}

pub type ArticleResult<T> = Result<T, ArticleError>;
