use serde::{Deserialize, Serialize};

use press_types::{Address, ContentId};

/// One confirmed registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Position in the log, starting at 1.
    pub seq: u64,
    /// The registered content id (the only payload the chain persists).
    pub cid: ContentId,
    /// Address that submitted the registration.
    pub publisher: Address,
    /// Chain-assigned inclusion time, seconds since the UNIX epoch.
    ///
    /// Distinct from the article's own timestamp and never used for feed order.
    pub block_timestamp: u64,
}

/// Result of an append once the registration is confirmed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub entry: RegistryEntry,
    /// `true` if the id was already registered and nothing new was appended.
    pub already_registered: bool,
}
