//! Single-voter, in-process consensus

use std::collections::BTreeMap;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{error, info};

use super::errors::{ConsensusError, ConsensusResult};
use super::role::NodeRole;
use super::{Committed, ConsensusAdapter};
use crate::fsm::StateMachine;
use crate::observability::Event;
use crate::store::TransactionalStore;

struct LogState<S: TransactionalStore> {
    state_machine: StateMachine<S>,
    commit_index: u64,
    /// Set by the first fatal apply; never cleared
    halted: Option<String>,
}

/// Commits every submitted entry immediately and applies it in order.
///
/// Entries are delivered to the state machine under one mutex, so at most
/// one Apply is in flight. A submitter that cannot take the mutex within
/// its timeout gets `Timeout` without its entry entering the log.
pub struct LocalConsensus<S: TransactionalStore> {
    node_id: String,
    address: String,
    log: Mutex<LogState<S>>,
    role: RwLock<NodeRole>,
    voters: RwLock<BTreeMap<String, String>>,
}

impl<S: TransactionalStore> LocalConsensus<S> {
    /// Bootstraps a cluster of one with this node as leader.
    ///
    /// Log indexes continue from the state machine's last WAL sequence.
    pub fn bootstrap(
        node_id: impl Into<String>,
        address: impl Into<String>,
        state_machine: StateMachine<S>,
    ) -> Self {
        let node_id = node_id.into();
        let address = address.into();
        let commit_index = state_machine.last_sequence();

        let mut voters = BTreeMap::new();
        voters.insert(node_id.clone(), address.clone());

        Self {
            node_id,
            address,
            log: Mutex::new(LogState {
                state_machine,
                commit_index,
                halted: None,
            }),
            role: RwLock::new(NodeRole::Leader),
            voters: RwLock::new(voters),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn role(&self) -> NodeRole {
        self.role.read().clone()
    }

    /// Gives up leadership, remembering who leads now if known.
    pub fn step_down(&self, leader: Option<String>) {
        *self.role.write() = NodeRole::Follower { leader };
    }

    pub fn become_leader(&self) {
        *self.role.write() = NodeRole::Leader;
    }

    /// Current voting members, by node id.
    pub fn voters(&self) -> BTreeMap<String, String> {
        self.voters.read().clone()
    }

    /// Index of the last applied entry.
    pub fn commit_index(&self) -> u64 {
        self.log.lock().commit_index
    }

    /// Reason the node halted, if it has.
    pub fn halt_reason(&self) -> Option<String> {
        self.log.lock().halted.clone()
    }

    /// Stops accepting entries and releases the WAL.
    pub fn shutdown(self) -> ConsensusResult<()> {
        self.log.into_inner().state_machine.close()?;
        Ok(())
    }

    fn not_leader(&self) -> ConsensusError {
        ConsensusError::NotLeader {
            leader: self.leader_address(),
        }
    }
}

impl<S: TransactionalStore> ConsensusAdapter for LocalConsensus<S> {
    fn submit_command(&self, entry: &[u8], timeout: Duration) -> ConsensusResult<Committed> {
        if !self.is_leader() {
            return Err(self.not_leader());
        }

        let mut log = self
            .log
            .try_lock_for(timeout)
            .ok_or(ConsensusError::Timeout(timeout))?;

        if let Some(reason) = &log.halted {
            return Err(ConsensusError::Halted {
                reason: reason.clone(),
            });
        }

        let index = log.commit_index + 1;
        match log.state_machine.apply(entry) {
            Ok(outcome) => {
                log.commit_index = index;
                Ok(Committed { index, outcome })
            }
            Err(e) => {
                error!(
                    event = %Event::FsmHalt,
                    index,
                    code = e.code(),
                    error = %e,
                    "committed entry could not be applied; halting"
                );
                log.halted = Some(e.to_string());
                Err(ConsensusError::Fatal(e))
            }
        }
    }

    fn is_leader(&self) -> bool {
        self.role.read().is_leader()
    }

    fn leader_address(&self) -> Option<String> {
        self.role.read().leader_address(&self.address)
    }

    fn add_voter(&self, node_id: &str, address: &str) -> ConsensusResult<()> {
        if node_id.is_empty() || address.is_empty() {
            return Err(ConsensusError::InvalidMember(
                "node_id and address are required".to_string(),
            ));
        }
        if !self.is_leader() {
            return Err(self.not_leader());
        }

        self.voters
            .write()
            .insert(node_id.to_string(), address.to_string());
        info!(event = %Event::VoterAdded, node_id, address, "voter added");
        Ok(())
    }
}
