//! JSON wire form of a command
//!
//! Shape: `{ "op": "SET"|"DELETE"|"TX_COMMIT", "key"?, "value"?,
//! "write_set"?: [{key, value}], "read_set"?: [{key, version}] }`.
//! Only the fields relevant to `op` are written. Decoding ignores fields
//! that do not belong to the op, so the canonical re-encoding drops them.

use serde::{Deserialize, Serialize};

use super::errors::{CommandError, CommandResult};
use super::{Command, ReadOp, WriteOp};

pub(crate) const OP_SET: &str = "SET";
pub(crate) const OP_DELETE: &str = "DELETE";
pub(crate) const OP_TX_COMMIT: &str = "TX_COMMIT";

pub(crate) fn is_known_op(op: &str) -> bool {
    matches!(op, OP_SET | OP_DELETE | OP_TX_COMMIT)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireCommand {
    pub op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub write_set: Vec<WriteOp>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub read_set: Vec<ReadOp>,
}

impl From<Command> for WireCommand {
    fn from(command: Command) -> Self {
        match command {
            Command::Set { key, value } => Self {
                op: OP_SET.to_string(),
                key: Some(key),
                value: Some(value),
                write_set: Vec::new(),
                read_set: Vec::new(),
            },
            Command::Delete { key } => Self {
                op: OP_DELETE.to_string(),
                key: Some(key),
                value: None,
                write_set: Vec::new(),
                read_set: Vec::new(),
            },
            Command::TxCommit {
                read_set,
                write_set,
            } => Self {
                op: OP_TX_COMMIT.to_string(),
                key: None,
                value: None,
                write_set,
                read_set,
            },
        }
    }
}

impl TryFrom<WireCommand> for Command {
    type Error = CommandError;

    fn try_from(wire: WireCommand) -> CommandResult<Self> {
        match wire.op.as_str() {
            OP_SET => Ok(Command::Set {
                key: require(wire.key, OP_SET, "key")?,
                // An empty value is legitimately omitted by older writers.
                value: wire.value.unwrap_or_default(),
            }),
            OP_DELETE => Ok(Command::Delete {
                key: require(wire.key, OP_DELETE, "key")?,
            }),
            OP_TX_COMMIT => Ok(Command::TxCommit {
                read_set: wire.read_set,
                write_set: wire.write_set,
            }),
            _ => Err(CommandError::UnrecognizedOp(wire.op)),
        }
    }
}

fn require(
    field: Option<String>,
    op: &'static str,
    name: &'static str,
) -> CommandResult<String> {
    field.ok_or(CommandError::MissingField { op, field: name })
}
