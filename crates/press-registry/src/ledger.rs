use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use press_types::{Address, ContentId};
use tracing::{debug, info, warn};

use crate::entry::{Confirmation, RegistryEntry};
use crate::error::{RegistryError, RegistryResult};
use crate::journal::Journal;
use crate::validation::validate_entries;

/// Chain id reported by a development ledger unless configured otherwise.
pub const LOCAL_CHAIN_ID: u64 = 31337;

#[derive(Default)]
struct LedgerState {
    entries: Vec<RegistryEntry>,
    index: HashMap<ContentId, usize>,
}

impl LedgerState {
    fn push(&mut self, entry: RegistryEntry) {
        self.index.insert(entry.cid, self.entries.len());
        self.entries.push(entry);
    }
}

/// Append-only registry log, optionally persisted to a [`Journal`].
///
/// Stands in for the chain in development and tests. Entries are shared by
/// every session opened against the same ledger, and each session appends
/// under its own publisher address. An entry is visible to readers only
/// after it has been made durable.
pub struct RegistryLedger {
    chain_id: u64,
    state: RwLock<LedgerState>,
    journal: Option<Journal>,
    halted: AtomicBool,
    list_calls: AtomicU64,
}

impl RegistryLedger {
    /// A volatile ledger that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            chain_id: LOCAL_CHAIN_ID,
            state: RwLock::new(LedgerState::default()),
            journal: None,
            halted: AtomicBool::new(false),
            list_calls: AtomicU64::new(0),
        }
    }

    /// Open a journal-backed ledger, replaying every intact entry.
    ///
    /// Entries that would break the log (null ids, repeats) are reported and
    /// left out of the replayed state.
    pub fn open(path: &Path) -> RegistryResult<Self> {
        let journal = Journal::open(path)?;
        let recovered = journal.recover()?;

        let report = validate_entries(&recovered);
        for violation in &report.violations {
            warn!(seq = violation.seq, kind = ?violation.kind, "{}", violation.description);
        }

        let mut state = LedgerState::default();
        for entry in recovered {
            if entry.cid.is_null() || state.index.contains_key(&entry.cid) {
                continue;
            }
            state.push(entry);
        }
        info!(path = %path.display(), entries = state.entries.len(), "registry ledger opened");

        Ok(Self {
            chain_id: LOCAL_CHAIN_ID,
            state: RwLock::new(state),
            journal: Some(journal),
            halted: AtomicBool::new(false),
            list_calls: AtomicU64::new(0),
        })
    }

    /// Open the journal at `path` as a ledger of `chain_id`.
    ///
    /// The first open records `chain_id` next to the journal. Later opens
    /// report the recorded id instead, so a client expecting another chain
    /// is refused at connect time.
    pub fn open_on_chain(path: &Path, chain_id: u64) -> RegistryResult<Self> {
        let ledger = Self::open(path)?;
        let recorded = match Self::recorded_chain_id(path)? {
            Some(recorded) => recorded,
            None => {
                fs::write(chain_marker(path), format!("{chain_id}\n"))?;
                chain_id
            }
        };
        if recorded != chain_id {
            warn!(recorded, requested = chain_id, "registry journal belongs to another chain");
        }
        Ok(ledger.with_chain_id(recorded))
    }

    /// Chain id recorded for the journal at `path`, if it has been opened
    /// with [`open_on_chain`](Self::open_on_chain).
    pub fn recorded_chain_id(path: &Path) -> RegistryResult<Option<u64>> {
        let marker = chain_marker(path);
        match fs::read_to_string(&marker) {
            Ok(raw) => raw.trim().parse().map(Some).map_err(|e| {
                RegistryError::Serialization(format!("{}: {e}", marker.display()))
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Report `chain_id` to connecting clients.
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Simulate an unreachable endpoint: every call fails while halted.
    pub fn set_halted(&self, halted: bool) {
        self.halted.store(halted, Ordering::SeqCst);
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    /// Number of `list_all` calls served so far.
    pub fn list_calls(&self) -> u64 {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.state.read().expect("lock poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn ensure_reachable(&self) -> RegistryResult<()> {
        if self.is_halted() {
            return Err(RegistryError::Unavailable("ledger endpoint halted".into()));
        }
        Ok(())
    }

    /// Register `cid` on behalf of `publisher`.
    pub fn record(&self, cid: &ContentId, publisher: Address) -> RegistryResult<Confirmation> {
        self.ensure_reachable()?;
        if cid.is_null() {
            return Err(RegistryError::EmptyContentId);
        }

        let mut state = self.state.write().expect("lock poisoned");
        if let Some(&pos) = state.index.get(cid) {
            debug!(cid = %cid.short_hex(), "content id already registered");
            return Ok(Confirmation {
                entry: state.entries[pos].clone(),
                already_registered: true,
            });
        }

        let (last_seq, last_timestamp) = state
            .entries
            .last()
            .map_or((0, 0), |e| (e.seq, e.block_timestamp));
        let entry = RegistryEntry {
            seq: last_seq + 1,
            cid: *cid,
            publisher,
            block_timestamp: unix_seconds().max(last_timestamp),
        };

        if let Some(journal) = &self.journal {
            journal.append(&entry)?;
        }
        state.push(entry.clone());

        info!(cid = %cid.short_hex(), seq = entry.seq, publisher = %publisher.short(), "content id registered");
        Ok(Confirmation {
            entry,
            already_registered: false,
        })
    }

    /// Registered ids in insertion order.
    pub fn list(&self) -> RegistryResult<Vec<ContentId>> {
        self.ensure_reachable()?;
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.read().expect("lock poisoned");
        Ok(state.entries.iter().map(|e| e.cid).collect())
    }

    /// Attribution for `cid`, if registered.
    pub fn lookup(&self, cid: &ContentId) -> RegistryResult<Option<RegistryEntry>> {
        self.ensure_reachable()?;
        let state = self.state.read().expect("lock poisoned");
        Ok(state.index.get(cid).map(|&pos| state.entries[pos].clone()))
    }
}

impl std::fmt::Debug for RegistryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryLedger")
            .field("chain_id", &self.chain_id)
            .field("entries", &self.len())
            .field("persistent", &self.journal.is_some())
            .field("halted", &self.is_halted())
            .finish()
    }
}

fn chain_marker(journal: &Path) -> PathBuf {
    journal.with_extension("chain")
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publisher() -> Address {
        Address::from_bytes([0xAB; 20])
    }

    fn cid(body: &str) -> ContentId {
        ContentId::for_payload(body.as_bytes())
    }

    // ----- Append semantics -----

    #[test]
    fn record_assigns_increasing_sequence() {
        let ledger = RegistryLedger::in_memory();
        let a = ledger.record(&cid("a"), publisher()).unwrap();
        let b = ledger.record(&cid("b"), publisher()).unwrap();

        assert_eq!(a.entry.seq, 1);
        assert_eq!(b.entry.seq, 2);
        assert!(!a.already_registered);
        assert!(b.entry.block_timestamp >= a.entry.block_timestamp);
        assert_eq!(ledger.list().unwrap(), vec![cid("a"), cid("b")]);
    }

    #[test]
    fn null_id_is_rejected() {
        let ledger = RegistryLedger::in_memory();
        let err = ledger.record(&ContentId::null(), publisher()).unwrap_err();
        assert!(matches!(err, RegistryError::EmptyContentId));
        assert!(ledger.is_empty());
    }

    #[test]
    fn duplicate_registration_returns_existing_entry() {
        let ledger = RegistryLedger::in_memory();
        let first = ledger.record(&cid("a"), publisher()).unwrap();
        let other = Address::from_bytes([0x01; 20]);
        let again = ledger.record(&cid("a"), other).unwrap();

        assert!(again.already_registered);
        assert_eq!(again.entry, first.entry);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn lookup_reports_attribution() {
        let ledger = RegistryLedger::in_memory();
        ledger.record(&cid("a"), publisher()).unwrap();

        let entry = ledger.lookup(&cid("a")).unwrap().unwrap();
        assert_eq!(entry.publisher, publisher());
        assert!(ledger.lookup(&cid("missing")).unwrap().is_none());
    }

    // ----- Outage simulation -----

    #[test]
    fn halted_ledger_refuses_every_call() {
        let ledger = RegistryLedger::in_memory();
        ledger.set_halted(true);

        assert!(matches!(ledger.list(), Err(RegistryError::Unavailable(_))));
        assert!(matches!(
            ledger.record(&cid("a"), publisher()),
            Err(RegistryError::Unavailable(_))
        ));
        assert_eq!(ledger.list_calls(), 0);

        ledger.set_halted(false);
        assert!(ledger.list().unwrap().is_empty());
        assert_eq!(ledger.list_calls(), 1);
    }

    // ----- Persistence -----

    #[test]
    fn journal_backed_ledger_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.journal");

        {
            let ledger = RegistryLedger::open(&path).unwrap();
            ledger.record(&cid("a"), publisher()).unwrap();
            ledger.record(&cid("b"), publisher()).unwrap();
        }

        let ledger = RegistryLedger::open(&path).unwrap();
        assert_eq!(ledger.list().unwrap(), vec![cid("a"), cid("b")]);
        let c = ledger.record(&cid("c"), publisher()).unwrap();
        assert_eq!(c.entry.seq, 3);
    }

    #[test]
    fn replay_drops_repeated_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dupes.journal");
        {
            let journal = Journal::open(&path).unwrap();
            for (seq, body) in [(1, "a"), (2, "a"), (3, "b")] {
                journal
                    .append(&RegistryEntry {
                        seq,
                        cid: cid(body),
                        publisher: publisher(),
                        block_timestamp: 100,
                    })
                    .unwrap();
            }
        }

        let ledger = RegistryLedger::open(&path).unwrap();
        assert_eq!(ledger.list().unwrap(), vec![cid("a"), cid("b")]);
    }

    #[test]
    fn sequence_continues_after_dropped_replay_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gaps.journal");
        {
            let journal = Journal::open(&path).unwrap();
            for (seq, body) in [(1, "a"), (2, "a"), (3, "b")] {
                journal
                    .append(&RegistryEntry {
                        seq,
                        cid: cid(body),
                        publisher: publisher(),
                        block_timestamp: 100,
                    })
                    .unwrap();
            }
        }

        {
            let ledger = RegistryLedger::open(&path).unwrap();
            let c = ledger.record(&cid("c"), publisher()).unwrap();
            assert_eq!(c.entry.seq, 4);
        }

        let journal = Journal::open(&path).unwrap();
        let report = validate_entries(&journal.recover().unwrap());
        assert!(!report
            .violations
            .iter()
            .any(|v| v.kind == crate::validation::ViolationKind::SequenceGap));
    }

    #[test]
    fn chain_id_is_recorded_on_first_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.journal");
        assert_eq!(RegistryLedger::recorded_chain_id(&path).unwrap(), None);

        let first = RegistryLedger::open_on_chain(&path, 11155111).unwrap();
        assert_eq!(first.chain_id(), 11155111);
        drop(first);

        let reopened = RegistryLedger::open_on_chain(&path, LOCAL_CHAIN_ID).unwrap();
        assert_eq!(reopened.chain_id(), 11155111);
        assert_eq!(RegistryLedger::recorded_chain_id(&path).unwrap(), Some(11155111));
    }

    #[test]
    fn chain_id_defaults_to_local() {
        assert_eq!(RegistryLedger::in_memory().chain_id(), LOCAL_CHAIN_ID);
        assert_eq!(RegistryLedger::in_memory().with_chain_id(11155111).chain_id(), 11155111);
    }
}
