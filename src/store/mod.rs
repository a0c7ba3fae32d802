//! In-memory versioned key-value store
//!
//! Every key maps to a value and a version. The version is 1 on the first
//! write, grows by exactly 1 on each later write, and disappears with the
//! key on delete.
//!
//! The state machine and the client-facing service depend on the
//! capability traits below rather than on `VersionedStore` itself, so tests
//! can substitute their own doubles.

mod versioned;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::command::{ReadOp, WriteOp};

pub use versioned::VersionedStore;

/// A value together with its per-key version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedValue {
    pub value: String,
    pub version: u64,
}

/// The new version a key received from a committed write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyVersion {
    pub key: String,
    pub version: u64,
}

/// A read-set entry that no longer matches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("key '{key}' changed since it was read: observed version {expected}, current version {actual}")]
pub struct VersionConflict {
    pub key: String,
    /// Version recorded in the read-set (0 = observed absent)
    pub expected: u64,
    /// Version in the store at validation time (0 = absent)
    pub actual: u64,
}

/// Get/Set/Delete capability shared by the production store and test doubles.
pub trait DataStore: Send + Sync {
    /// Returns the current value and version, or `None` if absent.
    fn get(&self, key: &str) -> Option<VersionedValue>;

    /// Inserts or overwrites `key`, returning its new version.
    fn set(&self, key: &str, value: &str) -> u64;

    /// Removes `key` entirely. Removing an absent key is a no-op.
    fn delete(&self, key: &str);
}

/// Atomic validate-then-write used to apply a transaction commit.
pub trait TransactionalStore: DataStore {
    /// Checks every read-set entry against current versions and, only if all
    /// match, applies the write-set in order.
    ///
    /// Validation and writes happen under one exclusive section: concurrent
    /// readers observe either none or all of the writes.
    fn commit_if_current(
        &self,
        read_set: &[ReadOp],
        write_set: &[WriteOp],
    ) -> Result<Vec<KeyVersion>, VersionConflict>;
}
