use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use press_types::Address;

use crate::error::{WalletError, WalletResult};

/// An injected wallet provider.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the user to expose accounts. May prompt.
    async fn request_accounts(&self) -> WalletResult<Vec<Address>>;

    /// Accounts already exposed, without prompting.
    async fn accounts(&self) -> WalletResult<Vec<Address>>;

    /// Chain the provider is currently connected to.
    async fn chain_id(&self) -> WalletResult<u64>;
}

/// A provider with fixed answers that tests and local tools can script.
#[derive(Debug)]
pub struct StaticProvider {
    installed: bool,
    accounts: RwLock<Vec<Address>>,
    exposed: AtomicBool,
    chain_id: AtomicU64,
    pending: AtomicU32,
    rejecting: AtomicBool,
    requests: AtomicU32,
}

impl StaticProvider {
    pub fn new(accounts: Vec<Address>, chain_id: u64) -> Self {
        Self {
            installed: true,
            accounts: RwLock::new(accounts),
            exposed: AtomicBool::new(false),
            chain_id: AtomicU64::new(chain_id),
            pending: AtomicU32::new(0),
            rejecting: AtomicBool::new(false),
            requests: AtomicU32::new(0),
        }
    }

    /// A provider that answers every call with `NotInstalled`.
    pub fn not_installed() -> Self {
        Self {
            installed: false,
            ..Self::new(Vec::new(), 0)
        }
    }

    /// Answer the next `count` account requests with `RequestPending`.
    pub fn set_pending(&self, count: u32) {
        self.pending.store(count, Ordering::SeqCst);
    }

    /// Make account requests fail with `UserRejected`.
    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        *self.accounts.write().expect("lock poisoned") = accounts;
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.chain_id.store(chain_id, Ordering::SeqCst);
    }

    /// Number of `request_accounts` calls received.
    pub fn request_count(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }

    fn ensure_installed(&self) -> WalletResult<()> {
        if self.installed {
            Ok(())
        } else {
            Err(WalletError::NotInstalled)
        }
    }
}

#[async_trait]
impl WalletProvider for StaticProvider {
    async fn request_accounts(&self) -> WalletResult<Vec<Address>> {
        self.ensure_installed()?;
        self.requests.fetch_add(1, Ordering::SeqCst);

        let pending = self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if pending.is_ok() {
            return Err(WalletError::RequestPending);
        }
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(WalletError::UserRejected);
        }

        self.exposed.store(true, Ordering::SeqCst);
        Ok(self.accounts.read().expect("lock poisoned").clone())
    }

    async fn accounts(&self) -> WalletResult<Vec<Address>> {
        self.ensure_installed()?;
        if !self.exposed.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        Ok(self.accounts.read().expect("lock poisoned").clone())
    }

    async fn chain_id(&self) -> WalletResult<u64> {
        self.ensure_installed()?;
        Ok(self.chain_id.load(Ordering::SeqCst))
    }
}
