use std::sync::Arc;

use async_trait::async_trait;
use press_types::ContentId;

use crate::error::StoreResult;

/// Content-addressed storage backend.
///
/// Implementations must satisfy these invariants:
/// - `put` returns an id that is a pure function of the payload.
/// - Writing an already-present payload is a no-op.
/// - `get` returns [`StoreError::NotFound`](crate::StoreError::NotFound)
///   when no payload is retrievable, never an empty buffer.
#[async_trait]
pub trait ContentBackend: Send + Sync {
    /// Store a payload and return its content-derived id.
    async fn put(&self, payload: &[u8]) -> StoreResult<ContentId>;

    /// Retrieve the payload stored under `id`.
    async fn get(&self, id: &ContentId) -> StoreResult<Vec<u8>>;

    /// Release network resources. Called once on shutdown.
    async fn stop(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Establishes a connection to a content backend.
///
/// Called at most once per successful initialization of a
/// [`ContentStore`](crate::ContentStore).
#[async_trait]
pub trait ContentConnector: Send + Sync {
    async fn connect(&self) -> StoreResult<Arc<dyn ContentBackend>>;
}

/// Connector for a backend that needs no setup.
pub struct Preconnected(Arc<dyn ContentBackend>);

impl Preconnected {
    pub fn new(backend: Arc<dyn ContentBackend>) -> Self {
        Self(backend)
    }
}

#[async_trait]
impl ContentConnector for Preconnected {
    async fn connect(&self) -> StoreResult<Arc<dyn ContentBackend>> {
        Ok(Arc::clone(&self.0))
    }
}
