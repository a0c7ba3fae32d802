//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::node::NodeError;
use crate::recovery::RecoveryError;
use crate::service::ServiceError;

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("data directory already initialized: {}", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("data directory not initialized: {}. Run 'heliosdb init' first.", .0.display())]
    NotInitialized(PathBuf),

    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("boot failed: {0}")]
    Boot(#[from] NodeError),

    #[error("recovery failed: {0}")]
    Recovery(#[from] RecoveryError),

    #[error("node halted: {0}")]
    Halted(ServiceError),
}

impl CliError {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "HELIOS_CLI_CONFIG_ERROR",
            CliError::Io(_) | CliError::Json(_) => "HELIOS_CLI_IO_ERROR",
            CliError::AlreadyInitialized(_) => "HELIOS_CLI_ALREADY_INITIALIZED",
            CliError::NotInitialized(_) => "HELIOS_CLI_NOT_INITIALIZED",
            CliError::CreateDir { .. } => "HELIOS_CLI_CREATE_DIR_FAILED",
            CliError::Boot(e) => e.code(),
            CliError::Recovery(e) => e.code(),
            CliError::Halted(e) => e.code(),
        }
    }
}
