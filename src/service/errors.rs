//! Client-facing error types
//!
//! Everything except a halted node is an ordinary, recoverable error
//! returned to the client. Nothing here is retried.

use thiserror::Error;

use crate::command::CommandError;
use crate::consensus::ConsensusError;
use crate::fsm::ApplyOutcome;
use crate::store::VersionConflict;
use crate::txn::TxnError;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not the leader; current leader is {}", .leader.as_deref().unwrap_or("unknown"))]
    NotLeader { leader: Option<String> },

    #[error(transparent)]
    Transaction(#[from] TxnError),

    #[error("transaction conflict: {0}")]
    Conflict(VersionConflict),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Consensus(ConsensusError),

    #[error("failed to encode command: {0}")]
    Encode(#[from] CommandError),

    #[error("unexpected apply outcome: {0:?}")]
    UnexpectedOutcome(ApplyOutcome),
}

impl From<ConsensusError> for ServiceError {
    fn from(e: ConsensusError) -> Self {
        match e {
            ConsensusError::NotLeader { leader } => ServiceError::NotLeader { leader },
            other => ServiceError::Consensus(other),
        }
    }
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NotLeader { .. } => "HELIOS_NOT_LEADER",
            ServiceError::Transaction(e) => e.code(),
            ServiceError::Conflict(_) => "HELIOS_TX_CONFLICT",
            ServiceError::InvalidRequest(_) => "HELIOS_INVALID_REQUEST",
            ServiceError::Consensus(e) => e.code(),
            ServiceError::Encode(_) => "HELIOS_ENCODE_FAILED",
            ServiceError::UnexpectedOutcome(_) => "HELIOS_UNEXPECTED_OUTCOME",
        }
    }

    /// Returns true if the node must halt.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ServiceError::Consensus(e) if e.is_fatal())
    }
}
