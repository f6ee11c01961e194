use std::collections::HashSet;

use crate::entry::RegistryEntry;

/// Result of checking a recovered entry stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub entry_count: u64,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific integrity violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub seq: u64,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    SequenceGap,
    NullContentId,
    DuplicateContentId,
    TimestampRegression,
}

/// Check that entries form a well-formed registry log.
///
/// Sequence numbers must run 1, 2, 3 without gaps, no entry may carry the
/// null id, every id appears at most once, and inclusion times never go
/// backwards.
pub fn validate_entries(entries: &[RegistryEntry]) -> ValidationReport {
    let mut violations = Vec::new();
    let mut seen = HashSet::new();
    let mut last_timestamp = 0u64;

    for (index, entry) in entries.iter().enumerate() {
        let expected_seq = (index + 1) as u64;
        if entry.seq != expected_seq {
            violations.push(Violation {
                seq: entry.seq,
                kind: ViolationKind::SequenceGap,
                description: format!("expected seq {expected_seq}, got {}", entry.seq),
            });
        }

        if entry.cid.is_null() {
            violations.push(Violation {
                seq: entry.seq,
                kind: ViolationKind::NullContentId,
                description: "entry carries the null content id".into(),
            });
        } else if !seen.insert(entry.cid) {
            violations.push(Violation {
                seq: entry.seq,
                kind: ViolationKind::DuplicateContentId,
                description: format!("{} registered more than once", entry.cid.short_hex()),
            });
        }

        if entry.block_timestamp < last_timestamp {
            violations.push(Violation {
                seq: entry.seq,
                kind: ViolationKind::TimestampRegression,
                description: format!(
                    "block timestamp {} precedes {last_timestamp}",
                    entry.block_timestamp
                ),
            });
        }
        last_timestamp = last_timestamp.max(entry.block_timestamp);
    }

    ValidationReport {
        entry_count: entries.len() as u64,
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use press_types::{Address, ContentId};

    fn entry(seq: u64, body: &str, ts: u64) -> RegistryEntry {
        RegistryEntry {
            seq,
            cid: ContentId::for_payload(body.as_bytes()),
            publisher: Address::from_bytes([1u8; 20]),
            block_timestamp: ts,
        }
    }

    #[test]
    fn well_formed_stream_passes() {
        let entries = vec![entry(1, "a", 10), entry(2, "b", 10), entry(3, "c", 12)];
        let report = validate_entries(&entries);
        assert!(report.is_valid());
        assert_eq!(report.entry_count, 3);
    }

    #[test]
    fn empty_stream_passes() {
        assert!(validate_entries(&[]).is_valid());
    }

    #[test]
    fn detects_each_violation_kind() {
        let mut null = entry(3, "x", 20);
        null.cid = ContentId::null();
        let entries = vec![
            entry(1, "a", 30),
            entry(2, "a", 31),
            null,
            entry(5, "d", 25),
        ];

        let kinds: Vec<_> = validate_entries(&entries)
            .violations
            .iter()
            .map(|v| v.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                ViolationKind::DuplicateContentId,
                ViolationKind::NullContentId,
                ViolationKind::TimestampRegression,
                ViolationKind::SequenceGap,
                ViolationKind::TimestampRegression,
            ]
        );
    }
}
