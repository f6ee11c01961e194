use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use press_types::ContentId;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{ContentBackend, ContentConnector};

/// Filesystem content backend.
///
/// Payloads live at `<root>/<first two hex chars>/<remaining hex>`, the same
/// fan-out layout git uses for loose objects. Files are written to a temporary
/// name and renamed into place, so a reader never sees a partial payload.
/// Every read re-hashes the payload against its id.
#[derive(Debug)]
pub struct FsContentBackend {
    root: PathBuf,
}

impl FsContentBackend {
    /// Open a backend rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &ContentId) -> PathBuf {
        let hex = id.to_hex();
        self.root.join(&hex[..2]).join(&hex[2..])
    }
}

#[async_trait]
impl ContentBackend for FsContentBackend {
    async fn put(&self, payload: &[u8]) -> StoreResult<ContentId> {
        let id = ContentId::for_payload(payload);
        let path = self.path_for(&id);
        if tokio::fs::try_exists(&path).await? {
            return Ok(id);
        }

        let dir = path
            .parent()
            .ok_or_else(|| StoreError::Unavailable("invalid content path".into()))?;
        tokio::fs::create_dir_all(dir).await?;

        let tmp = dir.join(format!(".tmp-{:016x}", rand::random::<u64>()));
        tokio::fs::write(&tmp, payload).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(cid = %id, bytes = payload.len(), "payload written");
        Ok(id)
    }

    async fn get(&self, id: &ContentId) -> StoreResult<Vec<u8>> {
        let payload = match tokio::fs::read(self.path_for(id)).await {
            Ok(payload) => payload,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(*id));
            }
            Err(e) => return Err(e.into()),
        };
        let computed = ContentId::for_payload(&payload);
        if computed != *id {
            return Err(StoreError::HashMismatch { id: *id, computed });
        }
        Ok(payload)
    }
}

/// Connector that opens a [`FsContentBackend`] on first use.
#[derive(Clone, Debug)]
pub struct FsConnector {
    root: PathBuf,
}

impl FsConnector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ContentConnector for FsConnector {
    async fn connect(&self) -> StoreResult<Arc<dyn ContentBackend>> {
        let backend = FsContentBackend::open(&self.root).await?;
        debug!(root = %self.root.display(), "filesystem content backend opened");
        Ok(Arc::new(backend))
    }
}
