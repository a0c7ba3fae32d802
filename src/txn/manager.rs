//! Registry of in-flight transactions

use std::collections::HashMap;

use parking_lot::RwLock;
use uuid::Uuid;

use super::errors::{TxnError, TxnResult};
use crate::command::{Command, ReadOp, WriteOp};

/// An in-flight client transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    id: String,
    read_set: Vec<ReadOp>,
    write_set: Vec<WriteOp>,
}

impl Transaction {
    fn new(id: String) -> Self {
        Self {
            id,
            read_set: Vec::new(),
            write_set: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Versions observed by the client, in staging order
    pub fn read_set(&self) -> &[ReadOp] {
        &self.read_set
    }

    /// Writes to apply on commit, in staging order
    pub fn write_set(&self) -> &[WriteOp] {
        &self.write_set
    }

    /// Packages the staged sets into the command submitted on commit.
    pub fn into_command(self) -> Command {
        Command::tx_commit(self.read_set, self.write_set)
    }
}

/// Tracks in-flight transactions by id.
///
/// One reader/writer lock guards the whole registry, so staging calls are
/// serialized per manager. Created at node start, never global.
#[derive(Debug, Default)]
pub struct TransactionManager {
    transactions: RwLock<HashMap<String, Transaction>>,
}

impl TransactionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new empty transaction under a random 128-bit id.
    pub fn begin(&self) -> Transaction {
        let transaction = Transaction::new(Uuid::new_v4().to_string());
        self.transactions
            .write()
            .insert(transaction.id.clone(), transaction.clone());
        transaction
    }

    /// Returns a copy of the transaction without removing it.
    pub fn get(&self, id: &str) -> Option<Transaction> {
        self.transactions.read().get(id).cloned()
    }

    /// Records that the client observed `key` at `version` (0 = absent).
    pub fn stage_read(&self, id: &str, key: &str, version: u64) -> TxnResult<()> {
        let mut transactions = self.transactions.write();
        let transaction = transactions
            .get_mut(id)
            .ok_or_else(|| TxnError::NotFound(id.to_string()))?;
        transaction.read_set.push(ReadOp::new(key, version));
        Ok(())
    }

    /// Appends a write. Repeated writes to one key are all kept; the last
    /// one wins when the commit is applied.
    pub fn stage_write(&self, id: &str, key: &str, value: &str) -> TxnResult<()> {
        let mut transactions = self.transactions.write();
        let transaction = transactions
            .get_mut(id)
            .ok_or_else(|| TxnError::NotFound(id.to_string()))?;
        transaction.write_set.push(WriteOp::new(key, value));
        Ok(())
    }

    /// Removes the transaction. Clearing an unknown id is a no-op.
    pub fn clear(&self, id: &str) {
        self.transactions.write().remove(id);
    }

    /// Number of in-flight transactions.
    pub fn len(&self) -> usize {
        self.transactions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.read().is_empty()
    }
}
