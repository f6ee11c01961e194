use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use press_types::ContentId;

use crate::error::{StoreError, StoreResult};
use crate::traits::ContentBackend;

/// Call counters for an [`InMemoryContentBackend`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BackendStats {
    pub puts: usize,
    pub gets: usize,
    pub stops: usize,
}

/// In-memory, HashMap-based content backend.
///
/// Intended for tests and embedding. Payloads are held behind a `RwLock` and
/// cloned on read/write. The backend can be taken offline or have payloads
/// evicted to reproduce an unreachable or garbage-collected network.
pub struct InMemoryContentBackend {
    payloads: RwLock<HashMap<ContentId, Vec<u8>>>,
    offline: AtomicBool,
    puts: AtomicUsize,
    gets: AtomicUsize,
    stops: AtomicUsize,
}

impl InMemoryContentBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self {
            payloads: RwLock::new(HashMap::new()),
            offline: AtomicBool::new(false),
            puts: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    /// Number of payloads currently stored.
    pub fn len(&self) -> usize {
        self.payloads.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the backend holds no payloads.
    pub fn is_empty(&self) -> bool {
        self.payloads.read().expect("lock poisoned").is_empty()
    }

    /// Returns `true` if a payload is stored under `id`.
    pub fn contains(&self, id: &ContentId) -> bool {
        self.payloads.read().expect("lock poisoned").contains_key(id)
    }

    /// Drop a payload, as an unpinned object would be collected by the network.
    pub fn evict(&self, id: &ContentId) -> bool {
        self.payloads
            .write()
            .expect("lock poisoned")
            .remove(id)
            .is_some()
    }

    /// While offline, every call fails with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn stats(&self) -> BackendStats {
        BackendStats {
            puts: self.puts.load(Ordering::SeqCst),
            gets: self.gets.load(Ordering::SeqCst),
            stops: self.stops.load(Ordering::SeqCst),
        }
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("backend offline".into()));
        }
        Ok(())
    }
}

impl Default for InMemoryContentBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentBackend for InMemoryContentBackend {
    async fn put(&self, payload: &[u8]) -> StoreResult<ContentId> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let id = ContentId::for_payload(payload);
        let mut map = self.payloads.write().expect("lock poisoned");
        // Same id always maps to the same payload.
        map.entry(id).or_insert_with(|| payload.to_vec());
        Ok(id)
    }

    async fn get(&self, id: &ContentId) -> StoreResult<Vec<u8>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let map = self.payloads.read().expect("lock poisoned");
        map.get(id).cloned().ok_or(StoreError::NotFound(*id))
    }

    async fn stop(&self) -> StoreResult<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryContentBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentBackend")
            .field("payload_count", &self.len())
            .field("offline", &self.offline.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_and_get() {
        let backend = InMemoryContentBackend::new();
        let id = backend.put(b"hello world").await.unwrap();
        assert!(!id.is_null());
        assert_eq!(backend.get(&id).await.unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn same_payload_produces_same_id() {
        let backend = InMemoryContentBackend::new();
        let id1 = backend.put(b"identical").await.unwrap();
        let id2 = backend.put(b"identical").await.unwrap();
        assert_eq!(id1, id2);
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn different_payloads_produce_different_ids() {
        let backend = InMemoryContentBackend::new();
        let id1 = backend.put(b"aaa").await.unwrap();
        let id2 = backend.put(b"bbb").await.unwrap();
        assert_ne!(id1, id2);
        assert_eq!(backend.len(), 2);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let backend = InMemoryContentBackend::new();
        let id = ContentId::for_payload(b"never stored");
        let err = backend.get(&id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn evicted_payload_is_not_found() {
        let backend = InMemoryContentBackend::new();
        let id = backend.put(b"transient").await.unwrap();
        assert!(backend.evict(&id));
        assert!(!backend.contains(&id));
        assert!(backend.get(&id).await.unwrap_err().is_not_found());
        assert!(!backend.evict(&id));
    }

    #[tokio::test]
    async fn offline_backend_is_unavailable() {
        let backend = InMemoryContentBackend::new();
        let id = backend.put(b"stored before outage").await.unwrap();
        backend.set_offline(true);
        assert!(matches!(
            backend.get(&id).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            backend.put(b"x").await,
            Err(StoreError::Unavailable(_))
        ));
        backend.set_offline(false);
        assert!(backend.get(&id).await.is_ok());
    }

    #[tokio::test]
    async fn stats_count_calls() {
        let backend = InMemoryContentBackend::new();
        let id = backend.put(b"a").await.unwrap();
        backend.get(&id).await.unwrap();
        backend.get(&id).await.unwrap();
        backend.stop().await.unwrap();
        assert_eq!(
            backend.stats(),
            BackendStats {
                puts: 1,
                gets: 2,
                stops: 1
            }
        );
    }

    #[test]
    fn debug_format() {
        let backend = InMemoryContentBackend::default();
        let debug = format!("{backend:?}");
        assert!(debug.contains("InMemoryContentBackend"));
        assert!(debug.contains("payload_count"));
    }
}
