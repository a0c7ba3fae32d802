//! Recovery subsystem for heliosdb
//!
//! There are no snapshots: every start replays the whole WAL into an
//! empty store before the node accepts Apply calls.
//!
//! # Invariants
//!
//! - The WAL is the single source of truth for recovery
//! - Sequential replay from the first record
//! - Halt on corruption

mod errors;
mod replay;
mod startup;

pub use errors::{RecoveryError, RecoveryResult};
pub use replay::{ReplayStats, WalReplayer};
pub use startup::{RecoveryManager, RecoveryState};
