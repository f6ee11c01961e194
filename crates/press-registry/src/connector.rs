use std::sync::Arc;

use async_trait::async_trait;
use press_types::{Address, ContentId};
use tracing::debug;

use crate::entry::{Confirmation, RegistryEntry};
use crate::error::{RegistryError, RegistryResult};
use crate::ledger::RegistryLedger;
use crate::traits::{RegistryBackend, RegistryConnector, RegistryReader, RegistryWriter};

impl RegistryLedger {
    /// Open a session that appends on behalf of `publisher`.
    pub fn session(self: &Arc<Self>, publisher: Address) -> LedgerSession {
        LedgerSession::new(Arc::clone(self), publisher)
    }
}

/// A publisher's connection to a [`RegistryLedger`].
#[derive(Clone, Debug)]
pub struct LedgerSession {
    ledger: Arc<RegistryLedger>,
    publisher: Address,
}

impl LedgerSession {
    pub fn new(ledger: Arc<RegistryLedger>, publisher: Address) -> Self {
        Self { ledger, publisher }
    }

    pub fn ledger(&self) -> &Arc<RegistryLedger> {
        &self.ledger
    }
}

#[async_trait]
impl RegistryWriter for LedgerSession {
    async fn append(&self, cid: &ContentId) -> RegistryResult<Confirmation> {
        self.ledger.record(cid, self.publisher)
    }

    fn publisher(&self) -> Address {
        self.publisher
    }
}

#[async_trait]
impl RegistryReader for LedgerSession {
    async fn list_all(&self) -> RegistryResult<Vec<ContentId>> {
        self.ledger.list()
    }

    async fn entry(&self, cid: &ContentId) -> RegistryResult<Option<RegistryEntry>> {
        self.ledger.lookup(cid)
    }
}

/// Connects sessions to a shared ledger.
///
/// When an expected chain id is set, connecting to a ledger that reports a
/// different one fails with [`RegistryError::NetworkMismatch`].
#[derive(Clone, Debug)]
pub struct LedgerConnector {
    ledger: Arc<RegistryLedger>,
    publisher: Address,
    expected_chain: Option<u64>,
}

impl LedgerConnector {
    pub fn new(ledger: Arc<RegistryLedger>, publisher: Address) -> Self {
        Self {
            ledger,
            publisher,
            expected_chain: None,
        }
    }

    /// Refuse to connect unless the ledger reports `chain_id`.
    pub fn expect_chain(mut self, chain_id: u64) -> Self {
        self.expected_chain = Some(chain_id);
        self
    }
}

#[async_trait]
impl RegistryConnector for LedgerConnector {
    async fn connect(&self) -> RegistryResult<Arc<dyn RegistryBackend>> {
        self.ledger.ensure_reachable()?;
        let actual = self.ledger.chain_id();
        if let Some(expected) = self.expected_chain {
            if expected != actual {
                return Err(RegistryError::NetworkMismatch { expected, actual });
            }
        }
        debug!(chain_id = actual, publisher = %self.publisher.short(), "ledger session opened");
        Ok(Arc::new(self.ledger.session(self.publisher)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_share_the_ledger() {
        let ledger = Arc::new(RegistryLedger::in_memory());
        let alice = LedgerConnector::new(ledger.clone(), Address::from_bytes([1; 20]))
            .connect()
            .await
            .unwrap();
        let bob = LedgerConnector::new(ledger.clone(), Address::from_bytes([2; 20]))
            .connect()
            .await
            .unwrap();

        let cid = ContentId::for_payload(b"shared");
        alice.append(&cid).await.unwrap();

        assert_eq!(bob.list_all().await.unwrap(), vec![cid]);
        let entry = bob.entry(&cid).await.unwrap().unwrap();
        assert_eq!(entry.publisher, alice.publisher());
    }

    #[tokio::test]
    async fn wrong_chain_is_refused() {
        let ledger = Arc::new(RegistryLedger::in_memory());
        let err = LedgerConnector::new(ledger, Address::from_bytes([1; 20]))
            .expect_chain(1)
            .connect()
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            RegistryError::NetworkMismatch {
                expected: 1,
                actual: 31337
            }
        ));
    }

    #[tokio::test]
    async fn halted_ledger_refuses_connection() {
        let ledger = Arc::new(RegistryLedger::in_memory());
        ledger.set_halted(true);
        let result = LedgerConnector::new(ledger, Address::from_bytes([1; 20]))
            .connect()
            .await;
        assert!(matches!(result, Err(RegistryError::Unavailable(_))));
    }
}
