//! Result of applying one committed entry

use serde::Serialize;

use crate::store::{KeyVersion, VersionConflict};

/// What an applied entry did to the store.
///
/// Every variant is a deterministic function of the entry and the store
/// state before it, so all replicas report the same outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ApplyOutcome {
    /// SET applied; `version` is the key's new version
    Set { key: String, version: u64 },
    /// DELETE applied
    Deleted { key: String },
    /// TX_COMMIT validated and every write applied
    Committed { versions: Vec<KeyVersion> },
    /// TX_COMMIT rejected; no write applied
    Conflict(VersionConflict),
    /// Entry with an unknown op, skipped without touching the store
    Ignored { op: String },
}

impl ApplyOutcome {
    /// Returns true if the store was left unchanged.
    pub fn is_noop(&self) -> bool {
        matches!(self, ApplyOutcome::Conflict(_) | ApplyOutcome::Ignored { .. })
    }
}
