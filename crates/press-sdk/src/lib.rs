//! High-level SDK for CipherPress.
//!
//! [`ArticleStore`] ties a content-addressed store, a device-local cache,
//! and the on-chain registry into one read/write path for articles:
//! publish, fetch one, and fetch the whole feed with partial-failure
//! tolerance. This is the main entry point for applications embedding
//! CipherPress.

pub mod config;
pub mod error;
pub mod policy;
pub mod store;

pub use config::PressConfig;
pub use error::{ArticleError, ArticleResult, ErrorKind};
pub use policy::ReconciliationPolicy;
pub use store::ArticleStore;

// Re-export key types
pub use press_cache::{FileCache, InMemoryCache, LocalCache};
pub use press_registry::{Confirmation, RegistryClient, RegistryEntry, RegistryLedger};
pub use press_store::{ContentStore, FsConnector, InMemoryContentBackend};
pub use press_types::{Address, Article, ArticleDraft, ContentId, Tags, Timestamp};
pub use press_wallet::{Network, RetryPolicy, StaticProvider, Wallet, WalletProvider};
