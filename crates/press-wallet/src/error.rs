/// Errors produced by wallet operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    /// No wallet provider is available.
    #[error("no wallet provider installed")]
    NotInstalled,

    /// The user declined the request.
    #[error("user rejected the request")]
    UserRejected,

    /// Another account request is already awaiting the user.
    #[error("a wallet request is already pending")]
    RequestPending,

    /// The provider returned no accounts.
    #[error("wallet exposed no accounts")]
    NoAccounts,

    /// Connection kept hitting a pending request until retries ran out.
    #[error("wallet connection failed after {attempts} attempts")]
    ConnectFailed { attempts: u32 },

    /// The wallet is on a different chain than required.
    #[error("wrong network: expected {expected} (chain {expected_id}), wallet is on chain {actual}")]
    NetworkMismatch {
        expected: String,
        expected_id: u64,
        actual: u64,
    },

    /// Any other provider failure.
    #[error("wallet provider error: {0}")]
    Provider(String),
}

/// Result alias for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;
