//! Persist-then-apply sequencing

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::errors::{FsmError, FsmResult};
use super::outcome::ApplyOutcome;
use crate::command::{self, Command, Entry};
use crate::observability::{Event, MetricsRegistry};
use crate::store::TransactionalStore;
use crate::wal::WalWriter;

/// Applies a decoded command to the store.
///
/// Shared by live apply and WAL replay so both produce identical state.
pub fn dispatch<S>(store: &S, command: &Command) -> ApplyOutcome
where
    S: TransactionalStore + ?Sized,
{
    match command {
        Command::Set { key, value } => ApplyOutcome::Set {
            key: key.clone(),
            version: store.set(key, value),
        },
        Command::Delete { key } => {
            store.delete(key);
            ApplyOutcome::Deleted { key: key.clone() }
        }
        Command::TxCommit {
            read_set,
            write_set,
        } => match store.commit_if_current(read_set, write_set) {
            Ok(versions) => ApplyOutcome::Committed { versions },
            Err(conflict) => ApplyOutcome::Conflict(conflict),
        },
    }
}

/// The state machine driven by the consensus layer.
///
/// `apply` takes `&mut self`: the caller delivers entries one at a time,
/// which is what makes dispatch safe without a lock of its own. Readers
/// only ever go through the store's reader lock.
pub struct StateMachine<S: TransactionalStore> {
    store: Arc<S>,
    wal: WalWriter,
    metrics: Arc<MetricsRegistry>,
}

impl<S: TransactionalStore> StateMachine<S> {
    /// Builds a state machine over a store already rebuilt from `wal`.
    pub fn new(store: Arc<S>, wal: WalWriter, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            store,
            wal,
            metrics,
        }
    }

    /// Applies one committed log entry.
    ///
    /// # Errors
    ///
    /// Every error is fatal. The store has not been touched when one is
    /// returned, but the node must still halt.
    pub fn apply(&mut self, entry: &[u8]) -> FsmResult<ApplyOutcome> {
        let entry = command::decode(entry).map_err(FsmError::Decode)?;

        // Unrecognized entries are logged too, so WAL sequence == log index
        let bytes_before = self.wal.bytes_written();
        let sequence = self.wal.append(entry.clone())?;
        let appended = self.wal.bytes_written() - bytes_before;
        self.metrics.record_wal_append(appended);
        trace!(event = %Event::WalAppend, sequence, bytes = appended, "logged");

        let command = match entry {
            Entry::Command(command) => command,
            Entry::Unrecognized { op, .. } => {
                warn!(event = %Event::UnrecognizedOp, sequence, op = %op, "skipping log entry with unrecognized op");
                self.metrics.increment_ignored();
                return Ok(ApplyOutcome::Ignored { op });
            }
        };

        let outcome = dispatch(self.store.as_ref(), &command);

        match &outcome {
            ApplyOutcome::Set { .. } => self.metrics.increment_sets(),
            ApplyOutcome::Deleted { .. } => self.metrics.increment_deletes(),
            ApplyOutcome::Committed { .. } => self.metrics.increment_commits(),
            ApplyOutcome::Conflict(conflict) => {
                self.metrics.increment_conflicts();
                warn!(
                    event = %Event::TxConflict,
                    sequence,
                    key = %conflict.key,
                    expected = conflict.expected,
                    actual = conflict.actual,
                    "transaction rejected by version check"
                );
            }
            ApplyOutcome::Ignored { .. } => {}
        }

        debug!(event = %Event::FsmApply, sequence, op = %command.op(), "applied");
        Ok(outcome)
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Sequence number of the last WAL record, 0 if the WAL is empty.
    pub fn last_sequence(&self) -> u64 {
        self.wal.last_sequence_number()
    }

    pub fn wal_path(&self) -> &Path {
        self.wal.path()
    }

    /// Releases the WAL after a final fsync.
    pub fn close(self) -> FsmResult<()> {
        self.wal.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{ReadOp, WriteOp};
    use crate::store::{DataStore, KeyVersion, VersionConflict, VersionedStore, VersionedValue};
    use crate::wal::{WalError, WalReader};
    use parking_lot::Mutex;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn machine(dir: &Path) -> StateMachine<VersionedStore> {
        StateMachine::new(
            Arc::new(VersionedStore::new()),
            WalWriter::open(dir).unwrap(),
            Arc::new(MetricsRegistry::new()),
        )
    }

    fn entry(command: &Command) -> Vec<u8> {
        command::encode(command).unwrap()
    }

    /// Store double that records how many WAL lines existed at each mutation.
    struct WalObservingStore {
        wal_path: PathBuf,
        inner: VersionedStore,
        wal_lines_at_mutation: Mutex<Vec<usize>>,
    }

    impl WalObservingStore {
        fn observe(&self) {
            let lines = std::fs::read(&self.wal_path)
                .map(|bytes| bytes.iter().filter(|b| **b == b'\n').count())
                .unwrap_or(0);
            self.wal_lines_at_mutation.lock().push(lines);
        }
    }

    impl DataStore for WalObservingStore {
        fn get(&self, key: &str) -> Option<VersionedValue> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> u64 {
            self.observe();
            self.inner.set(key, value)
        }

        fn delete(&self, key: &str) {
            self.observe();
            self.inner.delete(key)
        }
    }

    impl TransactionalStore for WalObservingStore {
        fn commit_if_current(
            &self,
            read_set: &[ReadOp],
            write_set: &[WriteOp],
        ) -> Result<Vec<KeyVersion>, VersionConflict> {
            self.observe();
            self.inner.commit_if_current(read_set, write_set)
        }
    }

    #[test]
    fn test_set_then_delete() {
        let temp_dir = TempDir::new().unwrap();
        let mut fsm = machine(temp_dir.path());

        let outcome = fsm.apply(&entry(&Command::set("mykey", "hello world"))).unwrap();
        assert_eq!(
            outcome,
            ApplyOutcome::Set {
                key: "mykey".into(),
                version: 1
            }
        );

        fsm.apply(&entry(&Command::delete("mykey"))).unwrap();
        assert!(fsm.store().get("mykey").is_none());
        assert_eq!(fsm.last_sequence(), 2);
    }

    #[test]
    fn test_wal_written_before_store_mutation() {
        let temp_dir = TempDir::new().unwrap();
        let wal = WalWriter::open(temp_dir.path()).unwrap();
        let store = Arc::new(WalObservingStore {
            wal_path: wal.path().to_path_buf(),
            inner: VersionedStore::new(),
            wal_lines_at_mutation: Mutex::new(Vec::new()),
        });
        let mut fsm = StateMachine::new(Arc::clone(&store), wal, Arc::new(MetricsRegistry::new()));

        fsm.apply(&entry(&Command::set("a", "1"))).unwrap();
        fsm.apply(&entry(&Command::delete("a"))).unwrap();
        fsm.apply(&entry(&Command::tx_commit(vec![], vec![WriteOp::new("b", "2")])))
            .unwrap();

        assert_eq!(*store.wal_lines_at_mutation.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn test_commit_applies_write_set_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let mut fsm = machine(temp_dir.path());

        let commit = Command::tx_commit(
            vec![],
            vec![WriteOp::new("a", "1"), WriteOp::new("a", "2"), WriteOp::new("b", "3")],
        );
        let outcome = fsm.apply(&entry(&commit)).unwrap();

        assert_eq!(
            outcome,
            ApplyOutcome::Committed {
                versions: vec![
                    KeyVersion { key: "a".into(), version: 1 },
                    KeyVersion { key: "a".into(), version: 2 },
                    KeyVersion { key: "b".into(), version: 1 },
                ]
            }
        );
        assert_eq!(fsm.store().get("a").unwrap().value, "2");
    }

    #[test]
    fn test_stale_read_set_rejects_whole_commit() {
        let temp_dir = TempDir::new().unwrap();
        let mut fsm = machine(temp_dir.path());

        fsm.apply(&entry(&Command::set("x", "v1"))).unwrap();
        fsm.apply(&entry(&Command::set("x", "concurrent"))).unwrap();

        let commit = Command::tx_commit(
            vec![ReadOp::new("x", 1)],
            vec![WriteOp::new("y", "side"), WriteOp::new("x", "mine")],
        );
        let outcome = fsm.apply(&entry(&commit)).unwrap();

        assert_eq!(
            outcome,
            ApplyOutcome::Conflict(VersionConflict {
                key: "x".into(),
                expected: 1,
                actual: 2
            })
        );
        assert_eq!(fsm.store().get("x").unwrap().value, "concurrent");
        assert!(fsm.store().get("y").is_none());
        // The rejected commit is still part of the log
        assert_eq!(fsm.last_sequence(), 3);
    }

    #[test]
    fn test_unrecognized_op_is_logged_but_not_applied() {
        let temp_dir = TempDir::new().unwrap();
        let mut fsm = machine(temp_dir.path());

        let outcome = fsm.apply(br#"{"op":"COMPACT","key":"k"}"#).unwrap();

        assert_eq!(outcome, ApplyOutcome::Ignored { op: "COMPACT".into() });
        assert!(fsm.store().is_empty());
        assert_eq!(fsm.last_sequence(), 1);

        let path = fsm.wal_path().to_path_buf();
        fsm.close().unwrap();
        let records = WalReader::open(&path).unwrap().read_all().unwrap();
        assert_eq!(records[0].entry.op_name(), "COMPACT");
    }

    #[test]
    fn test_wal_failure_is_fatal_and_leaves_store_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let mut fsm = machine(temp_dir.path());
        fsm.apply(&entry(&Command::set("a", "1"))).unwrap();

        let read_only = std::fs::File::open(fsm.wal_path()).unwrap();
        fsm.wal.replace_handle(read_only);

        let err = fsm.apply(&entry(&Command::set("a", "2"))).unwrap_err();
        assert!(matches!(err, FsmError::Wal(WalError::AppendFailed { .. })));
        assert!(err.is_fatal());

        let err = fsm
            .apply(&entry(&Command::tx_commit(vec![], vec![WriteOp::new("b", "1")])))
            .unwrap_err();
        assert!(matches!(err, FsmError::Wal(_)));

        assert_eq!(fsm.store().get("a").unwrap().version, 1);
        assert!(fsm.store().get("b").is_none());
        assert_eq!(fsm.last_sequence(), 1);
    }

    #[test]
    fn test_undecodable_entry_is_fatal_and_not_logged() {
        let temp_dir = TempDir::new().unwrap();
        let mut fsm = machine(temp_dir.path());

        let err = fsm.apply(b"\x00\x01not json").unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.code(), "HELIOS_FSM_DECODE_FAILED");

        let err = fsm.apply(br#"{"op":"SET"}"#).unwrap_err();
        assert!(matches!(err, FsmError::Decode(_)));

        assert_eq!(fsm.last_sequence(), 0);
        assert!(fsm.store().is_empty());
    }

    #[test]
    fn test_wal_holds_canonical_command() {
        let temp_dir = TempDir::new().unwrap();
        let mut fsm = machine(temp_dir.path());

        fsm.apply(br#"{"op":"DELETE","key":"k","value":"ignored"}"#)
            .unwrap();
        let path = fsm.wal_path().to_path_buf();
        fsm.close().unwrap();

        let records = WalReader::open(&path).unwrap().read_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].command(), Some(&Command::delete("k")));
    }

    #[test]
    fn test_metrics_follow_outcomes() {
        let temp_dir = TempDir::new().unwrap();
        let metrics = Arc::new(MetricsRegistry::new());
        let mut fsm = StateMachine::new(
            Arc::new(VersionedStore::new()),
            WalWriter::open(temp_dir.path()).unwrap(),
            Arc::clone(&metrics),
        );

        fsm.apply(&entry(&Command::set("a", "1"))).unwrap();
        fsm.apply(&entry(&Command::tx_commit(vec![ReadOp::new("a", 9)], vec![])))
            .unwrap();
        fsm.apply(br#"{"op":"NOPE"}"#).unwrap();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.sets, 1);
        assert_eq!(snapshot.conflicts, 1);
        assert_eq!(snapshot.ignored, 1);
        assert_eq!(snapshot.wal_records, 3);
        assert!(snapshot.wal_bytes > 0);
    }
}
