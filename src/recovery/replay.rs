//! WAL replay into a fresh store
//!
//! - Must start at the first record
//! - Must read sequentially
//! - Must apply through the same dispatch as live Apply
//! - On ANY corruption of a complete record: FATAL error, abort immediately

use std::path::Path;

use serde::Serialize;

use super::errors::{RecoveryError, RecoveryResult};
use crate::fsm::{self, ApplyOutcome};
use crate::store::TransactionalStore;
use crate::wal;

/// Statistics from WAL replay
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    /// Number of records replayed
    pub records_replayed: u64,
    /// Number of SETs
    pub sets: u64,
    /// Number of DELETEs
    pub deletes: u64,
    /// Number of TX_COMMITs that passed validation
    pub commits: u64,
    /// Number of TX_COMMITs rejected by validation
    pub conflicts: u64,
    /// Number of logged entries with an unrecognized op
    pub ignored: u64,
    /// Final sequence number
    pub final_sequence: u64,
    /// Whether an unterminated trailing record was skipped
    pub torn_tail: bool,
}

impl ReplayStats {
    fn record(&mut self, outcome: &ApplyOutcome) {
        match outcome {
            ApplyOutcome::Set { .. } => self.sets += 1,
            ApplyOutcome::Deleted { .. } => self.deletes += 1,
            ApplyOutcome::Committed { .. } => self.commits += 1,
            ApplyOutcome::Conflict(_) => self.conflicts += 1,
            ApplyOutcome::Ignored { .. } => self.ignored += 1,
        }
    }
}

/// Replays WAL records into a store
pub struct WalReplayer;

impl WalReplayer {
    /// Replays every record at `wal_path` into `store`.
    ///
    /// `store` must be empty. Replay is deterministic: the same WAL
    /// replayed into two fresh stores produces identical state. A missing
    /// WAL replays nothing.
    pub fn replay<S>(wal_path: &Path, store: &S) -> RecoveryResult<ReplayStats>
    where
        S: TransactionalStore + ?Sized,
    {
        let mut stats = ReplayStats::default();

        let position = wal::replay(wal_path, |command| {
            let outcome = fsm::dispatch(store, &command);
            stats.record(&outcome);
            Ok::<(), RecoveryError>(())
        })?;

        stats.records_replayed = position.records_replayed;
        stats.ignored = position.skipped;
        stats.final_sequence = position.last_sequence;
        stats.torn_tail = position.torn_tail;

        Ok(stats)
    }
}
