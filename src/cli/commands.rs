//! CLI command implementations
//!
//! `start` follows the node boot sequence strictly: configuration, logging,
//! recovery, then serving. Nothing is served until recovery completes.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use serde_json::json;
use tracing::{error, info};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};
use super::protocol::{handle, Reply};
use crate::config::Config;
use crate::node::Node;
use crate::observability::{self, Event};
use crate::recovery::RecoveryManager;
use crate::store::VersionedStore;
use crate::wal::wal_path;

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Start { config, bootstrap } => start(&config, bootstrap),
        Command::Inspect { config } => inspect(&config),
    }
}

fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    observability::init_logging(&config.log_level);
    info!(event = %Event::ConfigLoaded, path = %config_path.display(), node_id = %config.node_id, "configuration loaded");
    Ok(config)
}

fn is_initialized(data_dir: &Path) -> bool {
    wal_path(data_dir).parent().map_or(false, Path::exists)
}

/// Initialize a new data directory
///
/// Creates the directory layout. Writes no WAL records.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let data_dir = config.data_path();

    if is_initialized(data_dir) {
        return Err(CliError::AlreadyInitialized(data_dir.to_path_buf()));
    }

    let wal_file = config.wal_path();
    if let Some(wal_dir) = wal_file.parent() {
        fs::create_dir_all(wal_dir).map_err(|e| CliError::CreateDir {
            path: wal_dir.to_path_buf(),
            source: e,
        })?;
    }

    write_response(
        &mut io::stdout().lock(),
        json!({"initialized": true, "data_dir": data_dir}),
    )
}

/// Boot the node and enter the serving loop on stdin/stdout.
pub fn start(config_path: &Path, bootstrap: bool) -> CliResult<()> {
    let config = load_config(config_path)?;

    if !is_initialized(config.data_path()) {
        return Err(CliError::NotInitialized(config.data_dir.clone()));
    }

    let node = Node::boot(&config, bootstrap)?;
    info!(event = %Event::Serving, address = %config.http_address(), "serving requests on stdin");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let served = serve(&node, stdin.lock(), stdout.lock());
    let shutdown = node.shutdown();

    served?;
    shutdown?;
    Ok(())
}

/// Serving loop: one request per input line, one response per output line.
///
/// Ends at end of input, or with an error if the node halts.
pub fn serve<R: BufRead, W: Write>(node: &Node, input: R, mut output: W) -> CliResult<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match handle(node, &line) {
            Ok(Reply::Ok(data)) => write_response(&mut output, data)?,
            Ok(Reply::Error { code, message }) => write_error(&mut output, code, &message)?,
            Err(e) => {
                error!(event = %Event::FsmHalt, code = e.code(), error = %e, "node halted");
                write_error(&mut output, e.code(), &e.to_string())?;
                return Err(e);
            }
        }
    }

    Ok(())
}

/// Replay the WAL into a fresh store and print it.
///
/// Read-only: the WAL is not opened for writing, so a torn trailing
/// record is reported but left in place.
pub fn inspect(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;

    if !is_initialized(config.data_path()) {
        return Err(CliError::NotInitialized(config.data_dir.clone()));
    }

    let store = VersionedStore::new();
    let stats = RecoveryManager::new(config.data_path()).replay_into(&store)?;

    write_response(
        &mut io::stdout().lock(),
        json!({"replay": stats, "store": store.snapshot()}),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::io::Cursor;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_config(temp_dir: &TempDir) -> PathBuf {
        let config_path = temp_dir.path().join("heliosdb.json");
        let data_dir = temp_dir.path().join("data");

        let config = json!({
            "node_id": "node1",
            "data_dir": data_dir.to_string_lossy()
        });

        fs::write(&config_path, config.to_string()).unwrap();
        config_path
    }

    fn responses(output: Vec<u8>) -> Vec<Value> {
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_init_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        init(&config_path).unwrap();

        assert!(temp_dir.path().join("data").join("wal").exists());
    }

    #[test]
    fn test_init_refuses_reinit() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        init(&config_path).unwrap();

        let err = init(&config_path).unwrap_err();
        assert_eq!(err.code(), "HELIOS_CLI_ALREADY_INITIALIZED");
    }

    #[test]
    fn test_start_requires_init() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        let err = start(&config_path, true).unwrap_err();
        assert_eq!(err.code(), "HELIOS_CLI_NOT_INITIALIZED");
    }

    #[test]
    fn test_serve_loop() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::new("node1", temp_dir.path());
        let node = Node::boot(&config, true).unwrap();

        let input = Cursor::new(
            "{\"op\":\"set\",\"key\":\"a\",\"value\":\"1\"}\n\n{\"op\":\"get\",\"key\":\"a\"}\nnot json\n",
        );
        let mut output = Vec::new();
        serve(&node, input, &mut output).unwrap();

        let replies = responses(output);
        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0]["status"], "ok");
        assert_eq!(replies[1]["data"]["value"], "1");
        assert_eq!(replies[2]["status"], "error");
        assert_eq!(replies[2]["code"], "HELIOS_INVALID_REQUEST");
    }

    #[test]
    fn test_inspect_requires_init() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        assert!(inspect(&config_path).is_err());
        init(&config_path).unwrap();
        inspect(&config_path).unwrap();
    }
}
