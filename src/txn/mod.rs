//! # Transactions
//!
//! Client transactions are staged here before commit. A transaction only
//! records what the client read and what it wants to write; it never
//! touches the store. Commit packages the staged sets into a single
//! `TX_COMMIT` command whose read-set is validated inside Apply.

mod errors;
mod manager;

pub use errors::{TxnError, TxnResult};
pub use manager::{Transaction, TransactionManager};
