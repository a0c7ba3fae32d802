//! Client-facing key-value service
//!
//! The write path a transport calls into: local reads, leader-only writes
//! submitted through consensus, and transaction staging and commit.

mod errors;
mod kv;

pub use errors::{ServiceError, ServiceResult};
pub use kv::KvService;
