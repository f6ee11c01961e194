use std::sync::Arc;

use async_trait::async_trait;
use press_types::{Address, ContentId};

use crate::entry::{Confirmation, RegistryEntry};
use crate::error::RegistryResult;

/// Write boundary of the registry.
#[async_trait]
pub trait RegistryWriter: Send + Sync {
    /// Append `cid` and wait for confirmation.
    ///
    /// Appending an id that is already registered is safe: the existing entry
    /// is returned with `already_registered` set.
    async fn append(&self, cid: &ContentId) -> RegistryResult<Confirmation>;

    /// The address registrations are attributed to.
    fn publisher(&self) -> Address;
}

/// Read boundary of the registry.
#[async_trait]
pub trait RegistryReader: Send + Sync {
    /// All registered ids in insertion order.
    async fn list_all(&self) -> RegistryResult<Vec<ContentId>>;

    /// Attribution for a registered id.
    async fn entry(&self, cid: &ContentId) -> RegistryResult<Option<RegistryEntry>>;
}

/// A connected registry: readable and writable.
pub trait RegistryBackend: RegistryReader + RegistryWriter {}

impl<T: RegistryReader + RegistryWriter> RegistryBackend for T {}

/// Establishes a connection to a registry backend.
#[async_trait]
pub trait RegistryConnector: Send + Sync {
    async fn connect(&self) -> RegistryResult<Arc<dyn RegistryBackend>>;
}
