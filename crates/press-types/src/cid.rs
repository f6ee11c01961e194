use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Content-derived identifier for a stored payload.
///
/// A `ContentId` is the BLAKE3 hash of the serialized payload. Identical
/// payloads always produce the same `ContentId`; the orchestrator relies on
/// this to treat cached bytes as interchangeable with store bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentId([u8; 32]);

impl ContentId {
    /// Compute the `ContentId` of a payload.
    pub fn for_payload(payload: &[u8]) -> Self {
        Self(*blake3::hash(payload).as_bytes())
    }

    /// Create a `ContentId` from a pre-computed hash.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The null id (all zeros). Never produced by a store.
    pub const fn null() -> Self {
        Self([0u8; 32])
    }

    /// Returns `true` if this is the null id.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s.trim()).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Returns `true` if `payload` hashes to this id.
    pub fn verifies(&self, payload: &[u8]) -> bool {
        Self::for_payload(payload) == *self
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.short_hex())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ContentId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 32]> for ContentId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_payload_is_deterministic() {
        let id1 = ContentId::for_payload(b"hello world");
        let id2 = ContentId::for_payload(b"hello world");
        assert_eq!(id1, id2);
    }

    #[test]
    fn different_payloads_produce_different_ids() {
        let id1 = ContentId::for_payload(b"hello");
        let id2 = ContentId::for_payload(b"world");
        assert_ne!(id1, id2);
    }

    #[test]
    fn null_is_all_zeros() {
        let null = ContentId::null();
        assert!(null.is_null());
        assert!(!ContentId::for_payload(b"").is_null());
    }

    #[test]
    fn hex_roundtrip() {
        let id = ContentId::for_payload(b"test");
        let parsed: ContentId = id.to_hex().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = ContentId::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 32,
                actual: 2
            }
        );
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(matches!(
            ContentId::from_hex("not-hex"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn verifies_matches_payload() {
        let id = ContentId::for_payload(b"payload");
        assert!(id.verifies(b"payload"));
        assert!(!id.verifies(b"tampered"));
    }

    #[test]
    fn display_is_full_hex() {
        let id = ContentId::for_payload(b"test");
        assert_eq!(format!("{id}").len(), 64);
        assert_eq!(id.short_hex().len(), 8);
    }
}
