use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use press_types::{Address, ContentId, InitCell, InitPhase};
use tracing::{debug, info};

use crate::entry::{Confirmation, RegistryEntry};
use crate::error::{RegistryError, RegistryResult};
use crate::traits::{RegistryBackend, RegistryConnector};

/// Default bound on a single chain call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A connected registry. Calls are bounded by the client's timeout.
#[derive(Clone)]
pub struct RegistryHandle {
    backend: Arc<dyn RegistryBackend>,
    timeout: Duration,
}

impl RegistryHandle {
    pub async fn append(&self, cid: &ContentId) -> RegistryResult<Confirmation> {
        if cid.is_null() {
            return Err(RegistryError::EmptyContentId);
        }
        bounded("append", self.timeout, self.backend.append(cid)).await
    }

    pub async fn list_all(&self) -> RegistryResult<Vec<ContentId>> {
        bounded("list", self.timeout, self.backend.list_all()).await
    }

    pub async fn entry(&self, cid: &ContentId) -> RegistryResult<Option<RegistryEntry>> {
        bounded("lookup", self.timeout, self.backend.entry(cid)).await
    }

    pub fn publisher(&self) -> Address {
        self.backend.publisher()
    }
}

impl std::fmt::Debug for RegistryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryHandle")
            .field("publisher", &self.backend.publisher())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Registry client with lazy, single-flight connection.
///
/// Performs no internal retries: a failed append surfaces to the caller,
/// which decides whether to try again.
pub struct RegistryClient {
    connector: Box<dyn RegistryConnector>,
    cell: InitCell<dyn RegistryBackend>,
    timeout: Duration,
}

impl RegistryClient {
    pub fn new(connector: impl RegistryConnector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
            cell: InitCell::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Bound every chain call (including connection) by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn phase(&self) -> InitPhase {
        self.cell.phase()
    }

    /// Connect if needed. Idempotent; concurrent callers share one attempt.
    pub async fn initialize(&self) -> RegistryResult<()> {
        self.handle().await.map(|_| ())
    }

    pub async fn handle(&self) -> RegistryResult<RegistryHandle> {
        let backend = self
            .cell
            .get_or_init(|| async {
                let backend =
                    bounded("connect", self.timeout, self.connector.connect()).await?;
                info!(publisher = %backend.publisher().short(), "registry connected");
                Ok::<_, RegistryError>(backend)
            })
            .await?;
        Ok(RegistryHandle {
            backend,
            timeout: self.timeout,
        })
    }

    /// Register `cid` and wait for confirmation.
    pub async fn append(&self, cid: &ContentId) -> RegistryResult<Confirmation> {
        if cid.is_null() {
            return Err(RegistryError::EmptyContentId);
        }
        self.handle().await?.append(cid).await
    }

    pub async fn list_all(&self) -> RegistryResult<Vec<ContentId>> {
        self.handle().await?.list_all().await
    }

    pub async fn entry(&self, cid: &ContentId) -> RegistryResult<Option<RegistryEntry>> {
        self.handle().await?.entry(cid).await
    }

    /// Drop the connection. A no-op if never connected.
    pub fn shutdown(&self) {
        match self.cell.take() {
            Some(_) => info!("registry disconnected"),
            None => debug!("registry shutdown without connection"),
        }
    }
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("phase", &self.cell.phase())
            .field("timeout", &self.timeout)
            .finish()
    }
}

async fn bounded<T>(
    operation: &'static str,
    limit: Duration,
    call: impl Future<Output = RegistryResult<T>>,
) -> RegistryResult<T> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| RegistryError::Timeout {
            operation,
            after: limit,
        })?
}
