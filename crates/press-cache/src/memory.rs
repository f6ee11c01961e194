use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use press_types::ContentId;

use crate::error::{CacheError, CacheResult};
use crate::traits::LocalCache;

/// In-memory cache for tests and embedding.
///
/// Writes can be made to fail, reproducing a full or read-only device store.
#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<BTreeMap<ContentId, Vec<u8>>>,
    read_only: AtomicBool,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    /// While read-only, every write fails.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }
}

impl LocalCache for InMemoryCache {
    fn write(&self, id: &ContentId, payload: &[u8]) -> CacheResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(CacheError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "cache is read-only",
            )));
        }
        self.entries
            .write()
            .expect("lock poisoned")
            .entry(*id)
            .or_insert_with(|| payload.to_vec());
        Ok(())
    }

    fn read(&self, id: &ContentId) -> CacheResult<Option<Vec<u8>>> {
        Ok(self.entries.read().expect("lock poisoned").get(id).cloned())
    }

    fn list_keys(&self) -> CacheResult<BTreeSet<ContentId>> {
        Ok(self
            .entries
            .read()
            .expect("lock poisoned")
            .keys()
            .copied()
            .collect())
    }

    fn contains(&self, id: &ContentId) -> CacheResult<bool> {
        Ok(self.entries.read().expect("lock poisoned").contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCache")
            .field("entry_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read() {
        let cache = InMemoryCache::new();
        let id = ContentId::for_payload(b"a");
        cache.write(&id, b"a").unwrap();
        assert_eq!(cache.read(&id).unwrap(), Some(b"a".to_vec()));
        assert!(cache.contains(&id).unwrap());
    }

    #[test]
    fn first_writer_wins() {
        let cache = InMemoryCache::new();
        let id = ContentId::for_payload(b"first");
        cache.write(&id, b"first").unwrap();
        cache.write(&id, b"second").unwrap();
        assert_eq!(cache.read(&id).unwrap(), Some(b"first".to_vec()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn read_missing_is_none() {
        let cache = InMemoryCache::new();
        assert!(cache.read(&ContentId::for_payload(b"x")).unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn list_keys_is_sorted() {
        let cache = InMemoryCache::new();
        for payload in [b"c".as_slice(), b"a", b"b"] {
            cache.write(&ContentId::for_payload(payload), payload).unwrap();
        }
        let keys: Vec<_> = cache.list_keys().unwrap().into_iter().collect();
        assert_eq!(keys.len(), 3);
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn read_only_rejects_writes() {
        let cache = InMemoryCache::new();
        cache.set_read_only(true);
        assert!(cache.write(&ContentId::for_payload(b"x"), b"x").is_err());
        cache.set_read_only(false);
        assert!(cache.write(&ContentId::for_payload(b"x"), b"x").is_ok());
    }
}
