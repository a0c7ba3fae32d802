//! CLI argument definitions using clap
//!
//! Commands:
//! - heliosdb init --config <path>
//! - heliosdb start --config <path> [--bootstrap]
//! - heliosdb inspect --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// HeliosDB - a replicated, transactional key-value store
#[derive(Parser, Debug)]
#[command(name = "heliosdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a new data directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./heliosdb.json")]
        config: PathBuf,
    },

    /// Boot the node and serve JSON requests from stdin
    Start {
        /// Path to configuration file
        #[arg(long, default_value = "./heliosdb.json")]
        config: PathBuf,

        /// Form a new cluster with this node as its only voter
        #[arg(long)]
        bootstrap: bool,
    },

    /// Replay the WAL and print the resulting store
    Inspect {
        /// Path to configuration file
        #[arg(long, default_value = "./heliosdb.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
