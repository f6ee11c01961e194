use std::collections::BTreeSet;

use press_types::ContentId;

use crate::error::CacheResult;

/// Device-local key-value persistence for article payloads.
///
/// Implementations must satisfy these invariants:
/// - `write` is first-writer-wins: an existing entry is never replaced.
///   Content addressing makes any second value for the same id identical.
/// - `list_keys` reports only well-formed article entries.
pub trait LocalCache: Send + Sync {
    /// Store `payload` under `id` unless an entry already exists.
    fn write(&self, id: &ContentId, payload: &[u8]) -> CacheResult<()>;

    /// Read the payload for `id`. `Ok(None)` if absent.
    fn read(&self, id: &ContentId) -> CacheResult<Option<Vec<u8>>>;

    /// All cached ids, in ascending order.
    fn list_keys(&self) -> CacheResult<BTreeSet<ContentId>>;

    /// Whether an entry exists for `id`.
    fn contains(&self, id: &ContentId) -> CacheResult<bool> {
        Ok(self.read(id)?.is_some())
    }
}
