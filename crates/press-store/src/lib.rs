//! Content-addressed storage client for CipherPress.
//!
//! The storage network itself is an external collaborator: this crate only
//! defines the `put(bytes) -> id` / `get(id) -> bytes` boundary and wraps it
//! with lazy single-flight connection, per-call timeouts, and shutdown.
//!
//! # Backends
//!
//! All backends implement [`ContentBackend`] and are reached through a
//! [`ContentConnector`]:
//!
//! - [`InMemoryContentBackend`] -- `HashMap`-based store for tests and embedding
//! - [`FsContentBackend`] -- one file per id under a local directory
//!
//! # Design Rules
//!
//! 1. Ids are content-derived: the same payload always yields the same id.
//! 2. Payloads are immutable once written; writes are idempotent.
//! 3. The store never interprets payloads.
//! 4. Every network call is bounded by the configured timeout.

pub mod error;
pub mod fs;
pub mod memory;
pub mod store;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::{FsConnector, FsContentBackend};
pub use memory::{BackendStats, InMemoryContentBackend};
pub use store::{ContentHandle, ContentStore};
pub use traits::{ContentBackend, ContentConnector, Preconnected};
