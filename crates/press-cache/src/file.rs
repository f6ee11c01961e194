use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use press_types::ContentId;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{CacheError, CacheResult};
use crate::key::{cache_key, parse_cache_key};
use crate::traits::LocalCache;

/// File-backed cache: one file per entry, named by its persisted key.
///
/// Survives process restarts. Entries are written to a temporary file and
/// linked into place without clobbering, so concurrent writers of the same
/// id cannot interleave and the first one to land wins.
#[derive(Debug)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Open (or create) a cache directory.
    pub fn open(dir: impl Into<PathBuf>) -> CacheResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| CacheError::Directory {
            path: dir.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &ContentId) -> PathBuf {
        self.dir.join(cache_key(id))
    }
}

impl LocalCache for FileCache {
    fn write(&self, id: &ContentId, payload: &[u8]) -> CacheResult<()> {
        let path = self.path_for(id);
        if path.exists() {
            return Ok(());
        }

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(payload)?;
        tmp.as_file().sync_all()?;

        match tmp.persist_noclobber(&path) {
            Ok(_) => {
                debug!(cid = %id, bytes = payload.len(), "cache entry written");
                Ok(())
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(CacheError::Persist {
                key: cache_key(id),
                reason: e.error.to_string(),
            }),
        }
    }

    fn read(&self, id: &ContentId) -> CacheResult<Option<Vec<u8>>> {
        match fs::read(self.path_for(id)) {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_keys(&self) -> CacheResult<BTreeSet<ContentId>> {
        let mut keys = BTreeSet::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            match parse_cache_key(name) {
                Some(id) => {
                    keys.insert(id);
                }
                None if name.starts_with('.') => {}
                None => warn!(file = %name, "ignoring unrecognized cache file"),
            }
        }
        Ok(keys)
    }

    fn contains(&self, id: &ContentId) -> CacheResult<bool> {
        Ok(self.path_for(id).exists())
    }
}
