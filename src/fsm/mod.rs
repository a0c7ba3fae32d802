//! Finite state machine: the single entry point for committed entries
//!
//! For each entry, in commit order:
//!
//! 1. Decode. Failure is fatal.
//! 2. Append the canonical command to the WAL and fsync. Failure is fatal.
//! 3. Dispatch to the store. TX_COMMIT validates its read-set here, inside
//!    the total order, so every replica reaches the same verdict.
//!
//! Entries with an unknown op are logged and skipped before step 2.

mod errors;
mod machine;
mod outcome;

pub use errors::{FsmError, FsmResult};
pub use machine::{dispatch, StateMachine};
pub use outcome::ApplyOutcome;
