use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use press_types::{ContentId, InitCell, InitPhase};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::traits::{ContentBackend, ContentConnector};

/// Default bound on a single network call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A connected content backend.
///
/// Only obtainable from [`ContentStore::handle`], so holding one means the
/// backend is initialized. Calls are bounded by the store's timeout.
#[derive(Clone)]
pub struct ContentHandle {
    backend: Arc<dyn ContentBackend>,
    timeout: Duration,
}

impl ContentHandle {
    pub async fn put(&self, payload: &[u8]) -> StoreResult<ContentId> {
        bounded("put", self.timeout, self.backend.put(payload)).await
    }

    pub async fn get(&self, id: &ContentId) -> StoreResult<Vec<u8>> {
        bounded("get", self.timeout, self.backend.get(id)).await
    }
}

impl std::fmt::Debug for ContentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentHandle")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Content store client with lazy, single-flight connection.
///
/// The backend is connected on first use. Concurrent first callers share one
/// connection attempt. [`shutdown`](Self::shutdown) is safe to call whether
/// or not the store was ever connected.
pub struct ContentStore {
    connector: Box<dyn ContentConnector>,
    cell: InitCell<dyn ContentBackend>,
    timeout: Duration,
}

impl ContentStore {
    pub fn new(connector: impl ContentConnector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
            cell: InitCell::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Bound every network call (including connection) by `timeout`.
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
    pub async fn initialize(&self) -> StoreResult<()> {
        self.handle().await.map(|_| ())
    }

    /// Obtain a connected handle, connecting first if needed.
    pub async fn handle(&self) -> StoreResult<ContentHandle> {
        let backend = self
            .cell
            .get_or_init(|| async {
                let backend = bounded("connect", self.timeout, self.connector.connect()).await?;
                info!("content store connected");
                Ok::<_, StoreError>(backend)
            })
            .await?;
        Ok(ContentHandle {
            backend,
            timeout: self.timeout,
        })
    }

    pub async fn put(&self, payload: &[u8]) -> StoreResult<ContentId> {
        self.handle().await?.put(payload).await
    }

    pub async fn get(&self, id: &ContentId) -> StoreResult<Vec<u8>> {
        self.handle().await?.get(id).await
    }

    /// Release the backend. A no-op if never connected.
    pub async fn shutdown(&self) -> StoreResult<()> {
        match self.cell.take() {
            Some(backend) => {
                backend.stop().await?;
                info!("content store stopped");
            }
            None => debug!("content store shutdown without connection"),
        }
        Ok(())
    }
}

impl std::fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStore")
            .field("phase", &self.cell.phase())
            .field("timeout", &self.timeout)
            .finish()
    }
}

async fn bounded<T>(
    operation: &'static str,
    limit: Duration,
    call: impl Future<Output = StoreResult<T>>,
) -> StoreResult<T> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| StoreError::Timeout {
            operation,
            after: limit,
        })?
}
