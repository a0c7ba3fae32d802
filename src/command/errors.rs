//! Command codec errors

use thiserror::Error;

/// Result type for command encoding and decoding
pub type CommandResult<T> = Result<T, CommandError>;

/// Errors produced while turning log bytes into a `Command` and back.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Bytes are not a JSON command object
    #[error("malformed command: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The entry has no string `op`
    #[error("command has no op")]
    MissingOp,

    /// A field required by the op is absent
    #[error("{op} command is missing required field '{field}'")]
    MissingField {
        op: &'static str,
        field: &'static str,
    },

    /// The op tag is not one this build understands
    #[error("unrecognized command op '{0}'")]
    UnrecognizedOp(String),
}
