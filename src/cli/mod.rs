//! CLI module for heliosdb
//!
//! Provides command-line interface for:
//! - init: Create directory structure
//! - start: Boot the node and serve JSON requests on stdin/stdout
//! - inspect: Replay the WAL and print the resulting store

mod args;
mod commands;
mod errors;
mod io;
mod protocol;

pub use args::{Cli, Command};
pub use commands::{init, inspect, run, run_command, serve, start};
pub use errors::{CliError, CliResult};
pub use io::{write_error, write_response};
pub use protocol::{handle, Reply, Request};
