//! Metrics registry for heliosdb
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Metrics registry containing all operational counters
///
/// All counters use Relaxed ordering; they are observational and never
/// feed back into apply decisions.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Total bytes written to WAL
    wal_bytes_written: AtomicU64,
    /// Total WAL records written
    wal_records_written: AtomicU64,
    /// SET commands applied
    sets_applied: AtomicU64,
    /// DELETE commands applied
    deletes_applied: AtomicU64,
    /// TX_COMMIT commands that passed validation
    commits_applied: AtomicU64,
    /// TX_COMMIT commands rejected by validation
    commit_conflicts: AtomicU64,
    /// Entries skipped because of an unknown op
    ignored_entries: AtomicU64,
    /// Records applied during WAL replay
    records_replayed: AtomicU64,
    /// Writes rejected at a non-leader
    not_leader_rejections: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // WAL metrics

    /// Record one appended WAL record of `bytes` length
    pub fn record_wal_append(&self, bytes: u64) {
        self.wal_records_written.fetch_add(1, Ordering::Relaxed);
        self.wal_bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Get WAL bytes written
    pub fn wal_bytes(&self) -> u64 {
        self.wal_bytes_written.load(Ordering::Relaxed)
    }

    // Apply metrics

    pub fn increment_sets(&self) {
        self.sets_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_deletes(&self) {
        self.deletes_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_commits(&self) {
        self.commits_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_conflicts(&self) {
        self.commit_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_ignored(&self) {
        self.ignored_entries.fetch_add(1, Ordering::Relaxed);
    }

    // Recovery metrics

    /// Add to the replayed record count
    pub fn add_replayed(&self, records: u64) {
        self.records_replayed.fetch_add(records, Ordering::Relaxed);
    }

    // Cluster metrics

    pub fn increment_not_leader(&self) {
        self.not_leader_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            wal_bytes: self.wal_bytes_written.load(Ordering::Relaxed),
            wal_records: self.wal_records_written.load(Ordering::Relaxed),
            sets: self.sets_applied.load(Ordering::Relaxed),
            deletes: self.deletes_applied.load(Ordering::Relaxed),
            commits: self.commits_applied.load(Ordering::Relaxed),
            conflicts: self.commit_conflicts.load(Ordering::Relaxed),
            ignored: self.ignored_entries.load(Ordering::Relaxed),
            replayed: self.records_replayed.load(Ordering::Relaxed),
            not_leader: self.not_leader_rejections.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub wal_bytes: u64,
    pub wal_records: u64,
    pub sets: u64,
    pub deletes: u64,
    pub commits: u64,
    pub conflicts: u64,
    pub ignored: u64,
    pub replayed: u64,
    pub not_leader: u64,
}
