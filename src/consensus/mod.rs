//! Boundary to the consensus layer
//!
//! The consensus layer owns ordering: it decides the committed sequence of
//! entries and hands each one to the state machine exactly once, in order.
//! The rest of the node only sees the `ConsensusAdapter` trait.
//!
//! `LocalConsensus` is a single-voter, in-process implementation. It keeps
//! the same contract (sequential delivery, leader-only writes, submit
//! timeout, halt after a fatal apply) so a networked implementation can be
//! swapped in behind the trait.

mod errors;
mod local;
mod role;

use std::time::Duration;

use crate::fsm::ApplyOutcome;

pub use errors::{ConsensusError, ConsensusResult};
pub use local::LocalConsensus;
pub use role::NodeRole;

/// An entry committed and applied by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    /// Log index assigned to the entry
    pub index: u64,
    /// What Apply did with it
    pub outcome: ApplyOutcome,
}

/// What the write path and transport need from consensus.
pub trait ConsensusAdapter: Send + Sync {
    /// Proposes an encoded command and waits until it is applied.
    ///
    /// A `Timeout` means the outcome is unknown, not that the command was
    /// dropped. Errors are never retried here.
    fn submit_command(&self, entry: &[u8], timeout: Duration) -> ConsensusResult<Committed>;

    fn is_leader(&self) -> bool;

    /// Address of the current leader, if known.
    fn leader_address(&self) -> Option<String>;

    /// Adds a voting member. Leader-only.
    fn add_voter(&self, node_id: &str, address: &str) -> ConsensusResult<()>;
}
