//! Sequential WAL replay
//!
//! Replay always starts at the first record and hands each command to the
//! caller in append order. Entries with an unrecognized op are skipped.
//! The first error, from the log or from the caller, stops replay and is
//! returned unchanged.

use std::io;
use std::path::Path;

use tracing::warn;

use super::errors::WalError;
use super::reader::WalReader;
use crate::command::{Command, Entry};
use crate::observability::Event;

/// Where replay stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayPosition {
    /// Number of records read, skipped ones included
    pub records_replayed: u64,
    /// Records with an unrecognized op, not handed to the caller
    pub skipped: u64,
    /// Sequence number of the last replayed record (0 if none)
    pub last_sequence: u64,
    /// Whether an unterminated trailing record was skipped
    pub torn_tail: bool,
}

/// Replays the WAL at `path`, invoking `apply` for every known command in
/// order.
///
/// A missing file is a first boot and replays nothing.
///
/// # Errors
///
/// Returns the first error from reading the log (converted into `E`) or
/// from `apply`. Records after the failing one are not visited.
pub fn replay<F, E>(path: &Path, mut apply: F) -> Result<ReplayPosition, E>
where
    F: FnMut(Command) -> Result<(), E>,
    E: From<WalError>,
{
    let mut reader = match WalReader::open(path) {
        Ok(reader) => reader,
        Err(WalError::OpenFailed { ref source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            return Ok(ReplayPosition::default())
        }
        Err(e) => return Err(e.into()),
    };

    let mut position = ReplayPosition::default();
    while let Some(record) = reader.read_next()? {
        match record.entry {
            Entry::Command(command) => apply(command)?,
            Entry::Unrecognized { op, .. } => {
                warn!(
                    event = %Event::UnrecognizedOp,
                    sequence = record.sequence_number,
                    op = %op,
                    "skipping logged entry with unrecognized op"
                );
                position.skipped += 1;
            }
        }
        position.records_replayed += 1;
        position.last_sequence = record.sequence_number;
    }
    position.torn_tail = reader.has_torn_tail();

    Ok(position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{self, ReadOp, WriteOp};
    use crate::wal::writer::{wal_path, WalWriter};
    use tempfile::TempDir;

    #[derive(Debug)]
    enum TestError {
        Wal(WalError),
        Refused(String),
    }

    impl From<WalError> for TestError {
        fn from(e: WalError) -> Self {
            TestError::Wal(e)
        }
    }

    #[test]
    fn test_missing_file_is_first_boot() {
        let temp_dir = TempDir::new().unwrap();
        let mut calls = 0;

        let position = replay(&temp_dir.path().join("absent.log"), |_| {
            calls += 1;
            Ok::<(), WalError>(())
        })
        .unwrap();

        assert_eq!(calls, 0);
        assert_eq!(position, ReplayPosition::default());
    }

    #[test]
    fn test_append_then_replay_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let commands = vec![
            Command::set("a", "1"),
            Command::tx_commit(
                vec![ReadOp::new("a", 1)],
                vec![WriteOp::new("a", "2"), WriteOp::new("b", "3")],
            ),
            Command::delete("b"),
        ];

        {
            let mut writer = WalWriter::open(temp_dir.path()).unwrap();
            for command in &commands {
                writer.append(command).unwrap();
            }
        }

        let mut replayed = Vec::new();
        let position = replay(&wal_path(temp_dir.path()), |command| {
            replayed.push(command);
            Ok::<(), WalError>(())
        })
        .unwrap();

        assert_eq!(replayed, commands);
        assert_eq!(position.records_replayed, 3);
        assert_eq!(position.last_sequence, 3);
    }

    #[test]
    fn test_unrecognized_entries_are_skipped_in_place() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut writer = WalWriter::open(temp_dir.path()).unwrap();
            writer.append(&Command::set("a", "1")).unwrap();
            writer
                .append(command::decode(br#"{"op":"FUTURE_OP","key":"a"}"#).unwrap())
                .unwrap();
            writer.append(&Command::set("a", "2")).unwrap();
        }

        let mut replayed = Vec::new();
        let position = replay(&wal_path(temp_dir.path()), |command| {
            replayed.push(command);
            Ok::<(), WalError>(())
        })
        .unwrap();

        assert_eq!(replayed, vec![Command::set("a", "1"), Command::set("a", "2")]);
        assert_eq!(position.records_replayed, 3);
        assert_eq!(position.skipped, 1);
        assert_eq!(position.last_sequence, 3);
    }

    #[test]
    fn test_apply_error_stops_replay() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut writer = WalWriter::open(temp_dir.path()).unwrap();
            writer.append(&Command::set("a", "1")).unwrap();
            writer.append(&Command::set("poison", "x")).unwrap();
            writer.append(&Command::set("c", "3")).unwrap();
        }

        let mut seen = Vec::new();
        let result = replay(&wal_path(temp_dir.path()), |command| {
            if let Command::Set { key, .. } = &command {
                if key == "poison" {
                    return Err(TestError::Refused(key.clone()));
                }
                seen.push(key.clone());
            }
            Ok(())
        });

        assert!(matches!(result, Err(TestError::Refused(ref k)) if k == "poison"));
        assert_eq!(seen, vec!["a".to_string()]);
    }

    #[test]
    fn test_corruption_is_propagated() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wal.log");
        std::fs::write(&path, b"corrupted\n").unwrap();

        let result = replay(&path, |_| Ok::<(), TestError>(()));
        assert!(matches!(result, Err(TestError::Wal(WalError::Corruption { .. }))));
    }
}
