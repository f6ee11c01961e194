//! On-chain article registry for CipherPress.
//!
//! The chain is an external collaborator. This crate defines its boundary --
//! an append-only, ordered log of [`ContentId`]s, each attributed to a
//! publisher and an inclusion time -- and provides:
//! - `RegistryReader` / `RegistryWriter` trait boundaries
//! - [`RegistryClient`] with lazy single-flight connection and per-call timeouts
//! - [`RegistryLedger`], an in-memory or journal-backed log for local
//!   development and tests
//! - Stream validation for the journal-backed log
//!
//! [`ContentId`]: press_types::ContentId

pub mod client;
pub mod connector;
pub mod entry;
pub mod error;
pub mod journal;
pub mod ledger;
pub mod traits;
pub mod validation;

pub use client::{RegistryClient, RegistryHandle};
pub use connector::{LedgerConnector, LedgerSession};
pub use entry::{Confirmation, RegistryEntry};
pub use error::{RegistryError, RegistryResult};
pub use journal::Journal;
pub use ledger::{RegistryLedger, LOCAL_CHAIN_ID};
pub use traits::{RegistryBackend, RegistryConnector, RegistryReader, RegistryWriter};
pub use validation::{validate_entries, ValidationReport, Violation, ViolationKind};
