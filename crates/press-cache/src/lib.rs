//! Device-local article cache for CipherPress.
//!
//! The cache mirrors content-store payloads by [`ContentId`]. It is a
//! write-through cache on the read path and the fallback source of content
//! when the store is unreachable. It is never authoritative for whether an
//! article exists -- only the registry is -- but it is authoritative for an
//! article's bytes once populated.
//!
//! [`ContentId`]: press_types::ContentId

pub mod error;
pub mod file;
pub mod key;
pub mod memory;
pub mod traits;

pub use error::{CacheError, CacheResult};
pub use file::FileCache;
pub use key::{cache_key, parse_cache_key, KEY_PREFIX};
pub use memory::InMemoryCache;
pub use traits::LocalCache;
