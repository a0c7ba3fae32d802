//! Request handling for the serving loop
//!
//! One JSON object per request, selected by `op`:
//!
//! ```text
//! {"op":"get","key":"k"}
//! {"op":"set","key":"k","value":"v"}
//! {"op":"delete","key":"k"}
//! {"op":"begin"}
//! {"op":"tx_read","tx_id":"..","key":"k"}
//! {"op":"tx_write","tx_id":"..","key":"k","value":"v"}
//! {"op":"tx_commit","tx_id":".."}
//! {"op":"tx_abort","tx_id":".."}
//! {"op":"join","node_id":"node2","addr":"10.0.0.2:9080"}
//! {"op":"status"}
//! ```

use serde::Deserialize;
use serde_json::{json, Value};

use super::errors::{CliError, CliResult};
use crate::consensus::ConsensusAdapter;
use crate::node::Node;
use crate::service::{ServiceError, ServiceResult};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Get { key: String },
    Set { key: String, value: String },
    Delete { key: String },
    Begin,
    TxRead { tx_id: String, key: String },
    TxWrite { tx_id: String, key: String, value: String },
    TxCommit { tx_id: String },
    TxAbort { tx_id: String },
    Join { node_id: String, addr: String },
    Status,
}

/// Response to one request line.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ok(Value),
    Error { code: &'static str, message: String },
}

/// Handles one request line.
///
/// Client mistakes and rejected operations become `Reply::Error`. Only a
/// fatal node condition is returned as `Err`, which ends the serving loop.
pub fn handle(node: &Node, line: &str) -> CliResult<Reply> {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            return Ok(Reply::Error {
                code: "HELIOS_INVALID_REQUEST",
                message: e.to_string(),
            })
        }
    };

    match execute(node, request) {
        Ok(reply) => Ok(reply),
        Err(e) if e.is_fatal() => Err(CliError::Halted(e)),
        Err(e) => Ok(Reply::from(e)),
    }
}

fn execute(node: &Node, request: Request) -> ServiceResult<Reply> {
    let service = node.service();

    let data = match request {
        Request::Get { key } => match service.get(&key)? {
            Some(current) => json!({"key": key, "value": current.value, "version": current.version}),
            None => {
                return Ok(Reply::Error {
                    code: "HELIOS_KEY_NOT_FOUND",
                    message: format!("key '{}' not found", key),
                })
            }
        },
        Request::Set { key, value } => {
            let version = service.set(&key, &value)?;
            json!({"key": key, "version": version})
        }
        Request::Delete { key } => {
            service.delete(&key)?;
            json!({"key": key, "deleted": true})
        }
        Request::Begin => json!({"tx_id": service.begin()}),
        Request::TxRead { tx_id, key } => {
            let value = service.read(&tx_id, &key)?;
            json!({"tx_id": tx_id, "key": key, "value": value})
        }
        Request::TxWrite { tx_id, key, value } => {
            service.stage_write(&tx_id, &key, &value)?;
            json!({"tx_id": tx_id, "staged": true})
        }
        Request::TxCommit { tx_id } => {
            let versions = service.commit(&tx_id)?;
            json!({"tx_id": tx_id, "committed": true, "versions": versions})
        }
        Request::TxAbort { tx_id } => {
            service.abort(&tx_id);
            json!({"tx_id": tx_id, "aborted": true})
        }
        Request::Join { node_id, addr } => {
            service.join(&node_id, &addr)?;
            json!({"node_id": node_id, "addr": addr, "joined": true})
        }
        Request::Status => json!({
            "node_id": node.config().node_id,
            "leader": service.consensus().is_leader(),
            "leader_address": service.consensus().leader_address(),
            "commit_index": service.consensus().commit_index(),
            "voters": service.consensus().voters(),
            "keys": node.store().len(),
            "metrics": node.metrics().snapshot(),
        }),
    };

    Ok(Reply::Ok(data))
}

impl From<ServiceError> for Reply {
    fn from(e: ServiceError) -> Self {
        Reply::Error {
            code: e.code(),
            message: e.to_string(),
        }
    }
}
