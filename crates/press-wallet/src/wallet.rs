use std::sync::RwLock;
use std::time::Duration;

use press_types::Address;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::{WalletError, WalletResult};
use crate::network::Network;
use crate::provider::WalletProvider;

/// Capacity of the account-change notification channel.
const EVENT_CAPACITY: usize = 16;

/// How to retry an account request that is already pending.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Pause between attempts.
    #[serde(rename = "delay_ms", with = "millis")]
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1000),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Notification emitted when the active account changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletEvent {
    /// A new active account, or `None` when the wallet disconnected.
    AccountChanged(Option<Address>),
}

/// Connection state for one wallet provider.
///
/// Holds the active address. Subscribers are notified whenever it changes,
/// whether through [`connect`](Self::connect), a provider push delivered via
/// [`accounts_changed`](Self::accounts_changed), or
/// [`disconnect`](Self::disconnect).
pub struct Wallet<P> {
    provider: P,
    retry: RetryPolicy,
    current: RwLock<Option<Address>>,
    events: broadcast::Sender<WalletEvent>,
}

impl<P: WalletProvider> Wallet<P> {
    pub fn new(provider: P) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            provider,
            retry: RetryPolicy::default(),
            current: RwLock::new(None),
            events,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Request accounts and make the first one active.
    ///
    /// Only `RequestPending` is retried, up to the policy's attempt count.
    /// A user rejection or any other provider error is returned at once.
    pub async fn connect(&self) -> WalletResult<Address> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        let accounts = loop {
            match self.provider.request_accounts().await {
                Ok(accounts) => break accounts,
                Err(WalletError::RequestPending) if attempt < max_attempts => {
                    warn!(attempt, max_attempts, "wallet request pending; retrying");
                    tokio::time::sleep(self.retry.delay).await;
                    attempt += 1;
                }
                Err(WalletError::RequestPending) => {
                    return Err(WalletError::ConnectFailed { attempts: attempt });
                }
                Err(e) => return Err(e),
            }
        };

        let address = accounts.first().copied().ok_or(WalletError::NoAccounts)?;
        self.set_current(Some(address));
        info!(address = %address.short(), attempts = attempt, "wallet connected");
        Ok(address)
    }

    /// The active address, if connected.
    pub fn current_address(&self) -> Option<Address> {
        *self.current.read().expect("lock poisoned")
    }

    /// Re-read exposed accounts without prompting and sync the active address.
    pub async fn check_connection(&self) -> WalletResult<Option<Address>> {
        let accounts = self.provider.accounts().await?;
        let address = accounts.first().copied();
        self.set_current(address);
        Ok(address)
    }

    /// Apply an account change pushed by the provider.
    pub fn accounts_changed(&self, accounts: &[Address]) {
        self.set_current(accounts.first().copied());
    }

    /// Forget the active address.
    pub fn disconnect(&self) {
        self.set_current(None);
    }

    /// Receive [`WalletEvent`]s from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }

    /// Fail unless the provider is on `network`.
    pub async fn ensure_network(&self, network: Network) -> WalletResult<()> {
        let actual = self.provider.chain_id().await?;
        if actual != network.chain_id() {
            return Err(WalletError::NetworkMismatch {
                expected: network.name().to_string(),
                expected_id: network.chain_id(),
                actual,
            });
        }
        Ok(())
    }

    fn set_current(&self, address: Option<Address>) {
        let mut current = self.current.write().expect("lock poisoned");
        if *current == address {
            return;
        }
        *current = address;
        drop(current);

        debug!(address = ?address.map(|a| a.short()), "active account changed");
        // No receivers is fine.
        let _ = self.events.send(WalletEvent::AccountChanged(address));
    }
}

impl<P> std::fmt::Debug for Wallet<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("current", &*self.current.read().expect("lock poisoned"))
            .field("retry", &self.retry)
            .finish()
    }
}
