//! Recovery Manager startup sequence
//!
//! # Startup Sequence (strict order)
//!
//! 1. Create the data directory if needed
//! 2. Replay the WAL from the first record into a fresh store
//! 3. Open the WAL writer (drops a torn trailing record)
//! 4. Build the state machine; only now may Apply calls arrive

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info};

use super::errors::{RecoveryError, RecoveryResult};
use super::replay::{ReplayStats, WalReplayer};
use crate::fsm::StateMachine;
use crate::observability::{Event, MetricsRegistry};
use crate::store::TransactionalStore;
use crate::wal::{self, WalError, WalWriter};

/// Recovery state after successful startup
pub struct RecoveryState<S: TransactionalStore> {
    /// State machine ready for Apply calls
    pub state_machine: StateMachine<S>,
    /// WAL replay statistics
    pub replay_stats: ReplayStats,
}

/// Recovery Manager that orchestrates startup
pub struct RecoveryManager {
    data_dir: PathBuf,
}

impl RecoveryManager {
    /// Creates a new recovery manager
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn wal_path(&self) -> PathBuf {
        wal::wal_path(&self.data_dir)
    }

    /// Replays the WAL into `store` without opening it for writing.
    pub fn replay_into<S>(&self, store: &S) -> RecoveryResult<ReplayStats>
    where
        S: TransactionalStore + ?Sized,
    {
        let wal_path = self.wal_path();
        info!(event = %Event::ReplayBegin, path = %wal_path.display(), "replaying WAL");

        let stats = WalReplayer::replay(&wal_path, store).map_err(|e| {
            if let RecoveryError::Wal(WalError::Corruption { .. }) = &e {
                error!(event = %Event::WalCorruption, error = %e, "refusing to start from a corrupt WAL");
            }
            e
        })?;

        info!(
            event = %Event::ReplayComplete,
            records = stats.records_replayed,
            sets = stats.sets,
            deletes = stats.deletes,
            commits = stats.commits,
            conflicts = stats.conflicts,
            ignored = stats.ignored,
            final_sequence = stats.final_sequence,
            torn_tail = stats.torn_tail,
            "WAL replay complete"
        );

        Ok(stats)
    }

    /// Executes the full recovery sequence.
    ///
    /// Returns a FATAL error on any failure.
    pub fn recover<S: TransactionalStore>(
        &self,
        store: Arc<S>,
        metrics: Arc<MetricsRegistry>,
    ) -> RecoveryResult<RecoveryState<S>> {
        fs::create_dir_all(&self.data_dir).map_err(|e| RecoveryError::DataDir {
            path: self.data_dir.clone(),
            source: e,
        })?;

        let replay_stats = self.replay_into(store.as_ref())?;
        metrics.add_replayed(replay_stats.records_replayed);

        let wal = WalWriter::open(&self.data_dir)?;

        Ok(RecoveryState {
            state_machine: StateMachine::new(store, wal, metrics),
            replay_stats,
        })
    }
}
