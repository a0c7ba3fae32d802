//! Write-Ahead Log (WAL) subsystem for heliosdb
//!
//! The WAL is the node's durability mechanism. A committed command is
//! appended and fsynced here before the in-memory store changes, so after a
//! crash the WAL always covers everything the store ever reflected.
//!
//! # Design Principles
//!
//! - Durability over throughput
//! - Determinism over optimization
//! - Explicit failure over silent recovery
//!
//! # Invariants Enforced
//!
//! - fsync before acknowledgment
//! - WAL precedes every store mutation
//! - Sequential, deterministic replay from the first record
//! - Checksums on every record
//! - Halt on corruption of any complete record

mod checksum;
mod errors;
mod reader;
mod record;
mod replay;
mod writer;

pub use checksum::compute_checksum;
pub use errors::{Severity, WalError, WalResult};
pub use reader::WalReader;
pub use record::WalRecord;
pub use replay::{replay, ReplayPosition};
pub use writer::{wal_path, WalWriter};
