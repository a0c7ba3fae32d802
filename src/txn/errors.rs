//! # Transaction Errors

use thiserror::Error;

/// Result type for transaction staging
pub type TxnResult<T> = Result<T, TxnError>;

/// Transaction staging errors
///
/// All of these are recoverable and returned straight to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxnError {
    #[error("Transaction not found: {0}")]
    NotFound(String),
}

impl TxnError {
    /// Stable error code for responses
    pub fn code(&self) -> &'static str {
        match self {
            TxnError::NotFound(_) => "HELIOS_TX_NOT_FOUND",
        }
    }
}
