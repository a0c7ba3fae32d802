//! WAL error types
//!
//! Error codes:
//! - HELIOS_WAL_OPEN_FAILED (ERROR severity)
//! - HELIOS_WAL_READ_FAILED (FATAL severity)
//! - HELIOS_WAL_APPEND_FAILED (FATAL severity)
//! - HELIOS_WAL_FSYNC_FAILED (FATAL severity)
//! - HELIOS_WAL_CORRUPTION (FATAL severity)
//! - HELIOS_WAL_ENCODE_FAILED (FATAL severity)
//!
//! Once the consensus layer has declared an entry committed, this node
//! cannot refuse it, so any failure to persist it is fatal.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::command::CommandError;

/// Severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, node continues
    Error,
    /// Node must halt
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// WAL error with enough context to locate the failure
#[derive(Debug, Error)]
pub enum WalError {
    /// WAL file or directory could not be opened
    #[error("failed to open WAL at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The disk read itself failed; the log may be intact
    #[error("WAL read failed at byte offset {offset}: {source}")]
    ReadFailed {
        offset: u64,
        #[source]
        source: io::Error,
    },

    /// write() of a record failed
    #[error("WAL append failed at sequence {sequence}: {source}")]
    AppendFailed {
        sequence: u64,
        #[source]
        source: io::Error,
    },

    /// fsync after a write failed
    #[error("WAL fsync failed: {message}: {source}")]
    FsyncFailed {
        message: String,
        #[source]
        source: io::Error,
    },

    /// A persisted record is unreadable or out of order
    #[error("WAL corruption: {message} ({detail})")]
    Corruption { message: String, detail: String },

    /// A command could not be encoded for the log
    #[error("WAL record encoding failed: {0}")]
    EncodeFailed(#[source] CommandError),
}

impl WalError {
    /// Create a WAL corruption error with sequence number context
    pub fn corruption_at_sequence(sequence: u64, reason: impl Into<String>) -> Self {
        WalError::Corruption {
            message: reason.into(),
            detail: format!("sequence_number: {}", sequence),
        }
    }

    /// Create a WAL corruption error with byte offset context
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        WalError::Corruption {
            message: reason.into(),
            detail: format!("byte_offset: {}", offset),
        }
    }

    /// Returns the machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            WalError::OpenFailed { .. } => "HELIOS_WAL_OPEN_FAILED",
            WalError::ReadFailed { .. } => "HELIOS_WAL_READ_FAILED",
            WalError::AppendFailed { .. } => "HELIOS_WAL_APPEND_FAILED",
            WalError::FsyncFailed { .. } => "HELIOS_WAL_FSYNC_FAILED",
            WalError::Corruption { .. } => "HELIOS_WAL_CORRUPTION",
            WalError::EncodeFailed(_) => "HELIOS_WAL_ENCODE_FAILED",
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        match self {
            WalError::OpenFailed { .. } => Severity::Error,
            _ => Severity::Fatal,
        }
    }

    /// Returns whether this error requires the node to halt
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

/// Result type for WAL operations
pub type WalResult<T> = Result<T, WalError>;
