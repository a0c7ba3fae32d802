//! FSM error types
//!
//! Error codes:
//! - HELIOS_FSM_DECODE_FAILED (FATAL severity)
//! - any WAL code (FATAL severity)
//!
//! Only fatal conditions are errors here. A rejected commit is an
//! `ApplyOutcome`, because every replica reaches the same verdict.

use thiserror::Error;

use crate::command::CommandError;
use crate::wal::{Severity, WalError};

/// Result type for FSM operations
pub type FsmResult<T> = Result<T, FsmError>;

/// A committed entry this node cannot apply faithfully.
///
/// The node must halt: continuing would let this replica diverge from
/// peers that applied the same entry.
#[derive(Debug, Error)]
pub enum FsmError {
    #[error("committed log entry cannot be decoded: {0}")]
    Decode(#[source] CommandError),

    #[error("committed log entry could not be persisted: {0}")]
    Wal(#[from] WalError),
}

impl FsmError {
    pub fn code(&self) -> &'static str {
        match self {
            FsmError::Decode(_) => "HELIOS_FSM_DECODE_FAILED",
            FsmError::Wal(e) => e.code(),
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }

    pub fn is_fatal(&self) -> bool {
        true
    }
}
