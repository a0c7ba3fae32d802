//! WAL writer with fsync enforcement
//!
//! - Every append is followed by fsync before it returns
//! - No batching, no async durability
//!
//! Acknowledgment before fsync is forbidden.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::errors::{WalError, WalResult};
use super::reader::WalReader;
use super::record::WalRecord;
use crate::command::Entry;
use crate::observability::Event;

/// Directory under the data directory holding the WAL
pub const WAL_DIR: &str = "wal";
/// WAL file name
pub const WAL_FILE: &str = "wal.log";

/// Returns `<data_dir>/wal/wal.log`.
pub fn wal_path(data_dir: &Path) -> PathBuf {
    data_dir.join(WAL_DIR).join(WAL_FILE)
}

/// Append-only WAL writer.
///
/// - Single file, never truncated except to drop a torn trailing record
/// - The file handle is released when the writer is dropped or closed
pub struct WalWriter {
    /// Path to the WAL file
    wal_path: PathBuf,
    /// Underlying file handle
    file: File,
    /// Next sequence number to assign (starts at 1, never reused)
    next_sequence: u64,
    /// Bytes appended through this writer
    bytes_written: u64,
}

impl WalWriter {
    /// Opens or creates the WAL at `<data_dir>/wal/wal.log`.
    ///
    /// Creates parent directories if needed.
    pub fn open(data_dir: &Path) -> WalResult<Self> {
        Self::open_file(&wal_path(data_dir))
    }

    /// Opens or creates a WAL file at an explicit path.
    ///
    /// Existing records are scanned to find the next sequence number. A torn
    /// trailing record is cut off so that new appends start on a clean line.
    ///
    /// # Errors
    ///
    /// - `OpenFailed` if the file or its directory cannot be created
    /// - `Corruption` if an existing complete record is invalid
    pub fn open_file(wal_path: &Path) -> WalResult<Self> {
        if let Some(dir) = wal_path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| WalError::OpenFailed {
                    path: dir.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(wal_path)
            .map_err(|e| WalError::OpenFailed {
                path: wal_path.to_path_buf(),
                source: e,
            })?;

        let mut reader = WalReader::open(wal_path)?;
        while reader.read_next()?.is_some() {}

        if reader.has_torn_tail() {
            let valid_len = reader.current_offset();
            warn!(
                event = %Event::WalTornTail,
                path = %wal_path.display(),
                valid_len,
                "discarding unterminated trailing WAL record"
            );
            file.set_len(valid_len).map_err(|e| WalError::OpenFailed {
                path: wal_path.to_path_buf(),
                source: e,
            })?;
            file.sync_all().map_err(|e| WalError::FsyncFailed {
                message: "fsync after torn record truncation".to_string(),
                source: e,
            })?;
        }

        Ok(Self {
            wal_path: wal_path.to_path_buf(),
            file,
            next_sequence: reader.last_sequence_number() + 1,
            bytes_written: 0,
        })
    }

    /// Returns the path to the WAL file.
    pub fn path(&self) -> &Path {
        &self.wal_path
    }

    /// Returns the next sequence number that will be assigned.
    pub fn next_sequence_number(&self) -> u64 {
        self.next_sequence
    }

    /// Returns the last assigned sequence number, or 0 if no records exist.
    pub fn last_sequence_number(&self) -> u64 {
        self.next_sequence - 1
    }

    /// Returns the number of bytes appended through this writer.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Appends a log entry with fsync enforcement.
    ///
    /// 1. Construct the record
    /// 2. Write it, delimiter included
    /// 3. fsync
    /// 4. Only after fsync may the caller treat the command as durable
    ///
    /// # Returns
    ///
    /// The sequence number assigned to this record.
    ///
    /// # Errors
    ///
    /// Every error is fatal to the node; see `WalError::is_fatal`.
    pub fn append(&mut self, entry: impl Into<Entry>) -> WalResult<u64> {
        let sequence_number = self.next_sequence;
        let record = WalRecord::new(sequence_number, entry)?;
        let serialized = record.serialize()?;

        self.file
            .write_all(&serialized)
            .map_err(|e| WalError::AppendFailed {
                sequence: sequence_number,
                source: e,
            })?;

        self.file.sync_all().map_err(|e| WalError::FsyncFailed {
            message: format!("after WAL append at sequence {}", sequence_number),
            source: e,
        })?;

        // Only advance after a successful fsync
        self.next_sequence += 1;
        self.bytes_written += serialized.len() as u64;

        Ok(sequence_number)
    }

    /// Swaps the underlying handle, leaving the sequence untouched.
    #[cfg(test)]
    pub(crate) fn replace_handle(&mut self, file: File) {
        self.file = file;
    }

    /// Flushes and releases the file handle.
    pub fn close(self) -> WalResult<()> {
        self.file.sync_all().map_err(|e| WalError::FsyncFailed {
            message: "final WAL fsync on close".to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use tempfile::TempDir;

    #[test]
    fn test_writer_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let wal_dir = temp_dir.path().join("wal");
        assert!(!wal_dir.exists());

        let _writer = WalWriter::open(temp_dir.path()).unwrap();

        assert!(wal_dir.join("wal.log").exists());
    }

    #[test]
    fn test_sequence_numbers_start_at_one() {
        let temp_dir = TempDir::new().unwrap();
        let writer = WalWriter::open(temp_dir.path()).unwrap();

        assert_eq!(writer.next_sequence_number(), 1);
        assert_eq!(writer.last_sequence_number(), 0);
    }

    #[test]
    fn test_sequence_numbers_increment() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = WalWriter::open(temp_dir.path()).unwrap();

        assert_eq!(writer.append(&Command::set("a", "1")).unwrap(), 1);
        assert_eq!(writer.append(&Command::delete("a")).unwrap(), 2);
        assert_eq!(writer.append(&Command::tx_commit(vec![], vec![])).unwrap(), 3);
        assert_eq!(writer.last_sequence_number(), 3);
        assert!(writer.bytes_written() > 0);
    }

    #[test]
    fn test_writer_reopens_with_correct_sequence() {
        let temp_dir = TempDir::new().unwrap();

        {
            let mut writer = WalWriter::open(temp_dir.path()).unwrap();
            writer.append(&Command::set("a", "1")).unwrap();
            writer.append(&Command::set("b", "2")).unwrap();
            writer.close().unwrap();
        }

        let mut writer = WalWriter::open(temp_dir.path()).unwrap();
        assert_eq!(writer.next_sequence_number(), 3);
        assert_eq!(writer.append(&Command::set("c", "3")).unwrap(), 3);
    }

    #[test]
    fn test_reopen_truncates_torn_record() {
        let temp_dir = TempDir::new().unwrap();
        let path = wal_path(temp_dir.path());

        {
            let mut writer = WalWriter::open(temp_dir.path()).unwrap();
            writer.append(&Command::set("a", "1")).unwrap();
        }
        let clean_len = fs::metadata(&path).unwrap().len();
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(br#"{"seq":2,"chec"#).unwrap();
        }

        let mut writer = WalWriter::open(temp_dir.path()).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), clean_len);
        assert_eq!(writer.append(&Command::set("b", "2")).unwrap(), 2);

        let records = WalReader::open(&path).unwrap().read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].command(), Some(&Command::set("b", "2")));
    }

    #[test]
    fn test_reopen_refuses_corrupt_log() {
        let temp_dir = TempDir::new().unwrap();
        let path = wal_path(temp_dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"this is not a record\n").unwrap();

        let result = WalWriter::open(temp_dir.path());
        assert!(matches!(result, Err(WalError::Corruption { .. })));
    }

    #[test]
    fn test_failed_write_does_not_advance_sequence() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = WalWriter::open(temp_dir.path()).unwrap();
        writer.append(&Command::set("a", "1")).unwrap();

        let read_only = File::open(writer.path()).unwrap();
        writer.replace_handle(read_only);

        let err = writer.append(&Command::set("b", "2")).unwrap_err();
        assert!(matches!(err, WalError::AppendFailed { sequence: 2, .. }));
        assert!(err.is_fatal());
        assert_eq!(writer.last_sequence_number(), 1);
    }

    #[test]
    fn test_open_file_at_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("app.wal");

        let mut writer = WalWriter::open_file(&path).unwrap();
        writer.append(&Command::set("k", "v")).unwrap();

        assert_eq!(writer.path(), path.as_path());
        assert!(path.exists());
    }
}
