//! WAL reader with strict corruption detection
//!
//! - Records are read strictly in append order from byte 0
//! - Checksum mismatch, unparseable lines and sequence gaps halt reading
//! - A final line missing its delimiter is a torn write from a crash
//!   mid-append; it was never acknowledged, so it ends the log cleanly

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::errors::{WalError, WalResult};
use super::record::{WalRecord, RECORD_DELIMITER};

/// WAL reader for sequential replay.
pub struct WalReader {
    /// Buffered reader for sequential reads
    reader: BufReader<File>,
    /// Byte offset just past the last complete record
    current_offset: u64,
    /// Last successfully read sequence number
    last_sequence: u64,
    /// Whether an unterminated trailing record was found
    torn_tail: bool,
}

impl WalReader {
    /// Opens a WAL file for reading.
    ///
    /// # Errors
    ///
    /// Returns `WalError::OpenFailed` if the file cannot be opened,
    /// including when it does not exist.
    pub fn open(wal_path: &Path) -> WalResult<Self> {
        let file = File::open(wal_path).map_err(|e| WalError::OpenFailed {
            path: wal_path.to_path_buf(),
            source: e,
        })?;

        Ok(Self {
            reader: BufReader::new(file),
            current_offset: 0,
            last_sequence: 0,
            torn_tail: false,
        })
    }

    /// Returns the byte offset just past the last complete record.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Returns the last successfully read sequence number.
    pub fn last_sequence_number(&self) -> u64 {
        self.last_sequence
    }

    /// Returns whether reading stopped at an unterminated trailing record.
    pub fn has_torn_tail(&self) -> bool {
        self.torn_tail
    }

    /// Reads the next record from the WAL.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))` if a record was successfully read
    /// - `Ok(None)` at end of file or at a torn trailing record
    /// - `Err(WalError::ReadFailed)` if the disk read itself fails
    /// - `Err(WalError::Corruption)` on any damaged or out-of-order record
    pub fn read_next(&mut self) -> WalResult<Option<WalRecord>> {
        if self.torn_tail {
            return Ok(None);
        }

        let mut line = Vec::new();
        let read = self
            .reader
            .read_until(RECORD_DELIMITER, &mut line)
            .map_err(|e| WalError::ReadFailed {
                offset: self.current_offset,
                source: e,
            })?;

        if read == 0 {
            return Ok(None);
        }

        if line.last() != Some(&RECORD_DELIMITER) {
            self.torn_tail = true;
            return Ok(None);
        }
        line.pop();

        if line.is_empty() {
            return Err(WalError::corruption_at_offset(
                self.current_offset,
                "empty record",
            ));
        }

        let record = WalRecord::deserialize(&line, self.current_offset)?;

        let expected = self.last_sequence + 1;
        if record.sequence_number != expected {
            return Err(WalError::corruption_at_sequence(
                record.sequence_number,
                format!(
                    "non-sequential sequence number: expected {}, got {}",
                    expected, record.sequence_number
                ),
            ));
        }

        self.current_offset += read as u64;
        self.last_sequence = record.sequence_number;

        Ok(Some(record))
    }

    /// Reads all records from the WAL.
    ///
    /// Any corruption causes immediate failure.
    pub fn read_all(&mut self) -> WalResult<Vec<WalRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.read_next()? {
            records.push(record);
        }
        Ok(records)
    }
}
