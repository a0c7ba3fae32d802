//! Replicated commands
//!
//! A `Command` is the only unit of state transition. The same byte form is
//! stored in the replicated log and, re-encoded canonically, in the WAL.
//!
//! # Invariants
//!
//! - Commands are immutable once constructed
//! - Encoding is deterministic: equal commands encode to equal bytes
//! - A `TxCommit` carries its read-set, so commit validation depends on
//!   nothing but the log entry and the store state at apply time

mod errors;
mod wire;

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

pub use errors::{CommandError, CommandResult};
use wire::{is_known_op, WireCommand, OP_DELETE, OP_SET, OP_TX_COMMIT};

/// A key observed by a transaction, with the version it had at read time.
///
/// Version 0 records that the key was absent when read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadOp {
    pub key: String,
    pub version: u64,
}

impl ReadOp {
    pub fn new(key: impl Into<String>, version: u64) -> Self {
        Self {
            key: key.into(),
            version,
        }
    }
}

/// A write staged by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOp {
    pub key: String,
    pub value: String,
}

impl WriteOp {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Command kind, used for logging and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Set,
    Delete,
    TxCommit,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Set => OP_SET,
            Op::Delete => OP_DELETE,
            Op::TxCommit => OP_TX_COMMIT,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state transition delivered through the replicated log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireCommand", into = "WireCommand")]
pub enum Command {
    /// Insert or overwrite a key
    Set { key: String, value: String },
    /// Remove a key entirely
    Delete { key: String },
    /// Validate the read-set, then apply the write-set as one batch
    TxCommit {
        read_set: Vec<ReadOp>,
        write_set: Vec<WriteOp>,
    },
}

impl Command {
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Command::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Command::Delete { key: key.into() }
    }

    pub fn tx_commit(read_set: Vec<ReadOp>, write_set: Vec<WriteOp>) -> Self {
        Command::TxCommit {
            read_set,
            write_set,
        }
    }

    /// Returns the command kind
    pub fn op(&self) -> Op {
        match self {
            Command::Set { .. } => Op::Set,
            Command::Delete { .. } => Op::Delete,
            Command::TxCommit { .. } => Op::TxCommit,
        }
    }
}

/// A replicated log entry as this build understands it.
///
/// Unknown ops are surfaced rather than rejected so that a node running an
/// older build can skip an entry it does not understand instead of halting.
/// The entry is kept verbatim so it still occupies its place in the WAL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Command(Command),
    Unrecognized { op: String, raw: Value },
}

impl Entry {
    /// Classifies a parsed JSON entry by its `op`.
    pub fn from_value(raw: Value) -> CommandResult<Self> {
        let op = match raw.get("op").and_then(Value::as_str) {
            Some(op) => op.to_string(),
            None => return Err(CommandError::MissingOp),
        };

        if !is_known_op(&op) {
            return Ok(Entry::Unrecognized { op, raw });
        }

        let wire: WireCommand = serde_json::from_value(raw)?;
        Ok(Entry::Command(Command::try_from(wire)?))
    }

    /// The op tag, known or not.
    pub fn op_name(&self) -> &str {
        match self {
            Entry::Command(command) => command.op().as_str(),
            Entry::Unrecognized { op, .. } => op,
        }
    }

    /// Canonical bytes: the command's encoding, or the verbatim entry with
    /// keys in sorted order.
    pub fn to_bytes(&self) -> CommandResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl From<Command> for Entry {
    fn from(command: Command) -> Self {
        Entry::Command(command)
    }
}

impl From<&Command> for Entry {
    fn from(command: &Command) -> Self {
        Entry::Command(command.clone())
    }
}

impl Serialize for Entry {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        match self {
            Entry::Command(command) => command.serialize(serializer),
            Entry::Unrecognized { raw, .. } => raw.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Entry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Entry::from_value(raw).map_err(de::Error::custom)
    }
}

/// Encode a command to its canonical JSON bytes.
pub fn encode(command: &Command) -> CommandResult<Vec<u8>> {
    Ok(serde_json::to_vec(command)?)
}

/// Decode log entry bytes.
///
/// # Errors
///
/// Returns `CommandError::Malformed` if the bytes are not a command object,
/// `CommandError::MissingOp` if there is no `op`, and
/// `CommandError::MissingField` if a known op lacks a required field.
pub fn decode(bytes: &[u8]) -> CommandResult<Entry> {
    let raw: Value = serde_json::from_slice(bytes)?;
    Entry::from_value(raw)
}
