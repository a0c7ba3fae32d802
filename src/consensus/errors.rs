//! Consensus error types
//!
//! Error codes:
//! - HELIOS_NOT_LEADER (ERROR)
//! - HELIOS_SUBMIT_TIMEOUT (ERROR)
//! - HELIOS_INVALID_MEMBER (ERROR)
//! - HELIOS_NODE_HALTED (FATAL)
//! - any FSM code (FATAL)

use std::time::Duration;

use thiserror::Error;

use crate::fsm::FsmError;
use crate::wal::Severity;

/// Result type for consensus operations
pub type ConsensusResult<T> = Result<T, ConsensusError>;

#[derive(Debug, Error)]
pub enum ConsensusError {
    /// Writes and membership changes go through the leader only
    #[error("not the leader; current leader is {}", .leader.as_deref().unwrap_or("unknown"))]
    NotLeader { leader: Option<String> },

    /// The outcome is unknown to the caller; the command may still commit
    #[error("command not submitted within {0:?}")]
    Timeout(Duration),

    #[error("invalid voter: {0}")]
    InvalidMember(String),

    /// Apply failed on this node; the node must halt
    #[error("state machine failed: {0}")]
    Fatal(#[from] FsmError),

    /// A previous apply failed; nothing more is accepted
    #[error("node halted: {reason}")]
    Halted { reason: String },
}

impl ConsensusError {
    pub fn code(&self) -> &'static str {
        match self {
            ConsensusError::NotLeader { .. } => "HELIOS_NOT_LEADER",
            ConsensusError::Timeout(_) => "HELIOS_SUBMIT_TIMEOUT",
            ConsensusError::InvalidMember(_) => "HELIOS_INVALID_MEMBER",
            ConsensusError::Fatal(e) => e.code(),
            ConsensusError::Halted { .. } => "HELIOS_NODE_HALTED",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ConsensusError::Fatal(_) | ConsensusError::Halted { .. } => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}
