use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use press_types::Address;
use press_wallet::{Network, RetryPolicy};
use serde::{Deserialize, Serialize};

use crate::error::{ArticleError, ArticleResult};
use crate::policy::ReconciliationPolicy;

/// CipherPress client configuration, stored as TOML.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressConfig {
    /// Root for the content store, cache, and registry journal.
    pub data_dir: PathBuf,
    pub network: Network,
    pub reconciliation: ReconciliationPolicy,
    /// Bound on each content store and registry call.
    pub network_timeout_ms: u64,
    /// Maximum article fetches in flight while assembling the feed.
    pub fetch_concurrency: usize,
    /// Publisher address exposed by the local wallet.
    pub author: Option<Address>,
    pub wallet_retry: RetryPolicy,
}

impl Default for PressConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".cipherpress"),
            network: Network::default(),
            reconciliation: ReconciliationPolicy::default(),
            network_timeout_ms: 30_000,
            fetch_concurrency: 8,
            author: None,
            wallet_retry: RetryPolicy::default(),
        }
    }
}

impl PressConfig {
    pub fn load(path: &Path) -> ArticleResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| ArticleError::Config(format!("{}: {e}", path.display())))?;
        toml::from_str(&text).map_err(|e| ArticleError::Config(format!("{}: {e}", path.display())))
    }

    pub fn save(&self, path: &Path) -> ArticleResult<()> {
        let text = toml::to_string_pretty(self).map_err(|e| ArticleError::Config(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| ArticleError::Config(format!("{}: {e}", parent.display())))?;
        }
        fs::write(path, text).map_err(|e| ArticleError::Config(format!("{}: {e}", path.display())))
    }

    pub fn network_timeout(&self) -> Duration {
        Duration::from_millis(self.network_timeout_ms)
    }

    pub fn content_dir(&self) -> PathBuf {
        self.data_dir.join("content")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    pub fn registry_path(&self) -> PathBuf {
        self.data_dir.join("registry.journal")
    }
}
