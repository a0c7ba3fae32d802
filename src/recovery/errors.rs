//! Recovery error types
//!
//! Error codes:
//! - HELIOS_RECOVERY_DATA_DIR (FATAL)
//! - any WAL code (FATAL)
//!
//! A node that cannot rebuild its store from the WAL must not serve.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::wal::{Severity, WalError};

/// Result type for recovery operations
pub type RecoveryResult<T> = Result<T, RecoveryError>;

/// Recovery error with full context
#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("failed to prepare data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("WAL recovery failed: {0}")]
    Wal(#[from] WalError),
}

impl RecoveryError {
    pub fn code(&self) -> &'static str {
        match self {
            RecoveryError::DataDir { .. } => "HELIOS_RECOVERY_DATA_DIR",
            RecoveryError::Wal(e) => e.code(),
        }
    }

    /// All recovery errors are FATAL
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }

    pub fn is_fatal(&self) -> bool {
        true
    }
}
