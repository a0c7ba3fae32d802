//! heliosdb - a replicated, transactional key-value store
//!
//! This crate is the replicated state-machine layer of a node: a versioned
//! in-memory store, a write-ahead log, the state machine that persists
//! every committed command before applying it, and the transaction manager
//! that stages optimistic reads and writes for a single atomic commit.
//!
//! Every node applying the same ordered command stream converges to the
//! same state, and a node restarted after a crash rebuilds that state by
//! replaying its WAL.

pub mod cli;
pub mod command;
pub mod config;
pub mod consensus;
pub mod fsm;
pub mod node;
pub mod observability;
pub mod recovery;
pub mod service;
pub mod store;
pub mod txn;
pub mod wal;
