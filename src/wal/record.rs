//! WAL record framing
//!
//! Each record is one line:
//!
//! ```text
//! {"seq":<u64>,"checksum":<u32>,"command":{...}}\n
//! ```
//!
//! - `seq` starts at 1 and grows by exactly 1 per record
//! - `checksum` is CRC32 over `seq` (u64 LE) followed by the canonical
//!   entry bytes
//! - `command` is either a known command or an unrecognized entry kept
//!   verbatim, so every log index has a record
//! - `\n` terminates the record; a line without it was never acknowledged

use serde::{Deserialize, Serialize};

use super::checksum::{compute_checksum, verify_checksum};
use super::errors::{WalError, WalResult};
use crate::command::{Command, CommandError, Entry};

/// Record delimiter
pub const RECORD_DELIMITER: u8 = b'\n';

/// A single persisted log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalRecord {
    /// Position in the log, starting at 1
    #[serde(rename = "seq")]
    pub sequence_number: u64,
    /// CRC32 over sequence number and canonical entry bytes
    pub checksum: u32,
    /// The logged entry
    #[serde(rename = "command")]
    pub entry: Entry,
}

fn checksum_input(sequence_number: u64, entry: &Entry) -> WalResult<Vec<u8>> {
    let encoded = entry.to_bytes().map_err(WalError::EncodeFailed)?;
    let mut buf = Vec::with_capacity(8 + encoded.len());
    buf.extend_from_slice(&sequence_number.to_le_bytes());
    buf.extend_from_slice(&encoded);
    Ok(buf)
}

impl WalRecord {
    /// Builds a record and computes its checksum.
    pub fn new(sequence_number: u64, entry: impl Into<Entry>) -> WalResult<Self> {
        let entry = entry.into();
        let checksum = compute_checksum(&checksum_input(sequence_number, &entry)?);
        Ok(Self {
            sequence_number,
            checksum,
            entry,
        })
    }

    /// The command, unless the entry's op is unrecognized.
    pub fn command(&self) -> Option<&Command> {
        match &self.entry {
            Entry::Command(command) => Some(command),
            Entry::Unrecognized { .. } => None,
        }
    }

    /// Serializes the record including its trailing delimiter.
    pub fn serialize(&self) -> WalResult<Vec<u8>> {
        let mut buf = serde_json::to_vec(self)
            .map_err(|e| WalError::EncodeFailed(CommandError::Malformed(e)))?;
        buf.push(RECORD_DELIMITER);
        Ok(buf)
    }

    /// Parses one record line (without its delimiter) and verifies the checksum.
    ///
    /// `offset` is only used to describe a failure.
    pub fn deserialize(line: &[u8], offset: u64) -> WalResult<Self> {
        let record: WalRecord = serde_json::from_slice(line).map_err(|e| {
            WalError::corruption_at_offset(offset, format!("unparseable record: {}", e))
        })?;

        let input = checksum_input(record.sequence_number, &record.entry)?;
        if !verify_checksum(&input, record.checksum) {
            return Err(WalError::corruption_at_sequence(
                record.sequence_number,
                format!(
                    "checksum mismatch: stored {:#010x}, computed {:#010x}",
                    record.checksum,
                    compute_checksum(&input)
                ),
            ));
        }

        Ok(record)
    }
}
