use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::entry::RegistryEntry;
use crate::error::{RegistryError, RegistryResult};

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Append-only journal of confirmed registry entries.
///
/// On-disk format, repeated per entry:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized RegistryEntry)]
/// ```
///
/// Every append is flushed and `fsync`ed before it returns, so an entry that
/// was reported as confirmed survives a crash. Recovery skips frames whose
/// CRC does not match and stops at a torn tail.
pub struct Journal {
    path: PathBuf,
    writer: Mutex<JournalWriter>,
}

struct JournalWriter {
    writer: BufWriter<File>,
    offset: u64,
}

impl Journal {
    /// Open (or create) the journal file at `path`.
    pub fn open(path: &Path) -> RegistryResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let offset = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(JournalWriter {
                writer: BufWriter::new(file),
                offset,
            }),
        })
    }

    /// Durably append one entry. Returns the byte offset it was written at.
    pub fn append(&self, entry: &RegistryEntry) -> RegistryResult<u64> {
        let payload =
            bincode::serialize(entry).map_err(|e| RegistryError::Serialization(e.to_string()))?;
        let length = payload.len() as u32;
        let crc = crc32fast::hash(&payload);

        let mut w = self.writer.lock().expect("journal mutex poisoned");
        let entry_offset = w.offset;

        w.writer.write_all(&length.to_le_bytes())?;
        w.writer.write_all(&crc.to_le_bytes())?;
        w.writer.write_all(&payload)?;
        w.writer.flush()?;
        w.writer.get_ref().sync_all()?;

        w.offset += HEADER_SIZE as u64 + payload.len() as u64;

        debug!(offset = entry_offset, seq = entry.seq, "journal append");
        Ok(entry_offset)
    }

    /// Read back every intact entry in write order.
    pub fn recover(&self) -> RegistryResult<Vec<RegistryEntry>> {
        let mut file = BufReader::new(File::open(&self.path)?);
        let file_len = file.get_ref().metadata()?.len();
        let mut entries = Vec::new();
        let mut offset: u64 = 0;

        while offset + HEADER_SIZE as u64 <= file_len {
            file.seek(SeekFrom::Start(offset))?;

            let mut header = [0u8; HEADER_SIZE];
            match file.read_exact(&mut header) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }

            let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
            let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

            if length == 0 || offset + HEADER_SIZE as u64 + length as u64 > file_len {
                warn!(offset, length, file_len, "torn journal tail; stopping recovery");
                break;
            }

            let mut payload = vec![0u8; length as usize];
            match file.read_exact(&mut payload) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    warn!(offset, "truncated journal entry; stopping recovery");
                    break;
                }
                Err(e) => return Err(e.into()),
            }

            let actual_crc = crc32fast::hash(&payload);
            if actual_crc != expected_crc {
                warn!(
                    offset,
                    expected = expected_crc,
                    actual = actual_crc,
                    "CRC mismatch; skipping journal entry"
                );
                offset += HEADER_SIZE as u64 + length as u64;
                continue;
            }

            match bincode::deserialize::<RegistryEntry>(&payload) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(offset, error = %e, "undecodable journal entry; skipping"),
            }

            offset += HEADER_SIZE as u64 + length as u64;
        }

        debug!(recovered = entries.len(), "journal recovery complete");
        Ok(entries)
    }

    /// Current end of the journal in bytes.
    pub fn offset(&self) -> u64 {
        self.writer.lock().expect("journal mutex poisoned").offset
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for Journal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal")
            .field("path", &self.path)
            .field("offset", &self.offset())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use press_types::{Address, ContentId};

    fn make_entry(seq: u64) -> RegistryEntry {
        RegistryEntry {
            seq,
            cid: ContentId::for_payload(format!("article {seq}").as_bytes()),
            publisher: Address::from_bytes([7u8; 20]),
            block_timestamp: 1_700_000_000 + seq,
        }
    }

    #[test]
    fn append_and_recover_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::open(&dir.path().join("registry.journal")).unwrap();

        for seq in 1..=3 {
            journal.append(&make_entry(seq)).unwrap();
        }

        let recovered = journal.recover().unwrap();
        assert_eq!(recovered, vec![make_entry(1), make_entry(2), make_entry(3)]);
    }

    #[test]
    fn recover_empty_journal() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::open(&dir.path().join("empty.journal")).unwrap();
        assert!(journal.recover().unwrap().is_empty());
        assert_eq!(journal.offset(), 0);
    }

    #[test]
    fn reopen_continues_after_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reopen.journal");

        let journal = Journal::open(&path).unwrap();
        journal.append(&make_entry(1)).unwrap();
        let end = journal.offset();
        drop(journal);

        let journal = Journal::open(&path).unwrap();
        assert_eq!(journal.offset(), end);
        let off = journal.append(&make_entry(2)).unwrap();
        assert_eq!(off, end);
        assert_eq!(journal.recover().unwrap().len(), 2);
    }

    #[test]
    fn crc_mismatch_skips_only_the_damaged_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.journal");
        let journal = Journal::open(&path).unwrap();
        journal.append(&make_entry(1)).unwrap();
        journal.append(&make_entry(2)).unwrap();
        drop(journal);

        {
            let mut file = OpenOptions::new().read(true).write(true).open(&path).unwrap();
            file.seek(SeekFrom::Start(HEADER_SIZE as u64)).unwrap();
            let mut buf = [0u8; 1];
            file.read_exact(&mut buf).unwrap();
            buf[0] ^= 0xFF;
            file.seek(SeekFrom::Start(HEADER_SIZE as u64)).unwrap();
            file.write_all(&buf).unwrap();
            file.sync_all().unwrap();
        }

        let journal = Journal::open(&path).unwrap();
        assert_eq!(journal.recover().unwrap(), vec![make_entry(2)]);
    }

    #[test]
    fn torn_tail_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tail.journal");
        let journal = Journal::open(&path).unwrap();
        journal.append(&make_entry(1)).unwrap();
        journal.append(&make_entry(2)).unwrap();
        let total = journal.offset();
        drop(journal);

        {
            let file = OpenOptions::new().write(true).open(&path).unwrap();
            file.set_len(total - 3).unwrap();
        }

        let journal = Journal::open(&path).unwrap();
        assert_eq!(journal.recover().unwrap(), vec![make_entry(1)]);
    }
}
