//! Key-value operations over consensus

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::errors::{ServiceError, ServiceResult};
use crate::command::{self, Command};
use crate::consensus::ConsensusAdapter;
use crate::fsm::ApplyOutcome;
use crate::observability::{Event, MetricsRegistry};
use crate::store::{DataStore, KeyVersion, VersionedValue};
use crate::txn::{TransactionManager, TxnError};

fn require(field: &str, name: &str) -> ServiceResult<()> {
    if field.is_empty() {
        return Err(ServiceError::InvalidRequest(format!("{} is missing", name)));
    }
    Ok(())
}

/// Reads are served from the local store and may be stale on a follower.
/// Writes, commits and membership changes are rejected unless this node
/// leads, with the leader's address as a hint.
pub struct KvService<C: ConsensusAdapter, S: DataStore> {
    consensus: Arc<C>,
    store: Arc<S>,
    transactions: TransactionManager,
    submit_timeout: Duration,
    metrics: Arc<MetricsRegistry>,
}

impl<C: ConsensusAdapter, S: DataStore> KvService<C, S> {
    pub fn new(
        consensus: Arc<C>,
        store: Arc<S>,
        submit_timeout: Duration,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            consensus,
            store,
            transactions: TransactionManager::new(),
            submit_timeout,
            metrics,
        }
    }

    pub fn consensus(&self) -> &Arc<C> {
        &self.consensus
    }

    pub fn transactions(&self) -> &TransactionManager {
        &self.transactions
    }

    /// Local read of the current value and version.
    pub fn get(&self, key: &str) -> ServiceResult<Option<VersionedValue>> {
        require(key, "key")?;
        Ok(self.store.get(key))
    }

    /// Replicated SET; returns the key's new version.
    pub fn set(&self, key: &str, value: &str) -> ServiceResult<u64> {
        require(key, "key")?;
        self.ensure_leader()?;

        match self.submit(&Command::set(key, value))? {
            ApplyOutcome::Set { version, .. } => Ok(version),
            other => Err(ServiceError::UnexpectedOutcome(other)),
        }
    }

    /// Replicated DELETE.
    pub fn delete(&self, key: &str) -> ServiceResult<()> {
        require(key, "key")?;
        self.ensure_leader()?;

        match self.submit(&Command::delete(key))? {
            ApplyOutcome::Deleted { .. } => Ok(()),
            other => Err(ServiceError::UnexpectedOutcome(other)),
        }
    }

    /// Starts a transaction and returns its id.
    pub fn begin(&self) -> String {
        self.transactions.begin().id().to_string()
    }

    /// Reads `key` inside a transaction, recording the observed version
    /// (0 if absent) in its read-set.
    pub fn read(&self, id: &str, key: &str) -> ServiceResult<Option<String>> {
        require(key, "key")?;
        let current = self.store.get(key);
        let version = current.as_ref().map_or(0, |v| v.version);
        self.transactions.stage_read(id, key, version)?;
        Ok(current.map(|v| v.value))
    }

    /// Stages a write; nothing is visible until commit.
    pub fn stage_write(&self, id: &str, key: &str, value: &str) -> ServiceResult<()> {
        require(key, "key")?;
        self.transactions.stage_write(id, key, value)?;
        Ok(())
    }

    /// Submits the transaction as one TX_COMMIT.
    ///
    /// Once the transaction is found it is cleared whatever the result, so
    /// a client retries with a fresh transaction. A rejected read-set comes
    /// back as `Conflict` and none of the writes are applied.
    pub fn commit(&self, id: &str) -> ServiceResult<Vec<KeyVersion>> {
        self.ensure_leader()?;

        let transaction = self
            .transactions
            .get(id)
            .ok_or_else(|| TxnError::NotFound(id.to_string()))?;

        let result = self.submit(&transaction.into_command());
        self.transactions.clear(id);

        match result? {
            ApplyOutcome::Committed { versions } => Ok(versions),
            ApplyOutcome::Conflict(conflict) => Err(ServiceError::Conflict(conflict)),
            other => Err(ServiceError::UnexpectedOutcome(other)),
        }
    }

    /// Drops a transaction. Unknown ids are ignored.
    pub fn abort(&self, id: &str) {
        self.transactions.clear(id);
    }

    /// Adds a voting member through the leader.
    pub fn join(&self, node_id: &str, address: &str) -> ServiceResult<()> {
        require(node_id, "node_id")?;
        require(address, "addr")?;
        self.ensure_leader()?;

        self.consensus.add_voter(node_id, address)?;
        Ok(())
    }

    fn ensure_leader(&self) -> ServiceResult<()> {
        if self.consensus.is_leader() {
            return Ok(());
        }

        self.metrics.increment_not_leader();
        let leader = self.consensus.leader_address();
        debug!(event = %Event::NotLeader, leader = ?leader, "rejecting write");
        Err(ServiceError::NotLeader { leader })
    }

    fn submit(&self, command: &Command) -> ServiceResult<ApplyOutcome> {
        let entry = command::encode(command)?;
        let committed = self.consensus.submit_command(&entry, self.submit_timeout)?;
        Ok(committed.outcome)
    }
}
