// Message contract between the conversion coordinator and the worker.
//
// Commands travel as raw JSON values over the channel and are validated into
// the closed `WorkerCommand` union at the worker's boundary; everything past
// `decode_command` operates on typed variants only.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Commands sent from the coordinator to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "cmd", rename_all = "lowercase")]
pub enum WorkerCommand {
    /// Load the document staged at `from` and export a PDF to `to`.
    Convert {
        #[serde(rename = "fileName")]
        file_name: String,
        from: String,
        to: String,
    },
    /// Close whatever document the worker still holds open.
    Cleanup,
}

impl WorkerCommand {
    /// Encode as the raw wire value carried by the command channel.
    pub fn to_wire(&self) -> Value {
        match self {
            WorkerCommand::Convert {
                file_name,
                from,
                to,
            } => json!({
                "cmd": "convert",
                "fileName": file_name,
                "from": from,
                "to": to,
            }),
            WorkerCommand::Cleanup => json!({ "cmd": "cleanup" }),
        }
    }
}

/// Events emitted by the worker back to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "lowercase")]
pub enum WorkerEvent {
    /// Engine initialized; the worker accepts commands from here on.
    Ready,
    /// Export succeeded; the PDF bytes are staged at `to`.
    Converted {
        #[serde(rename = "fileName")]
        file_name: String,
        from: String,
        to: String,
    },
    /// A command failed. `file_name` is set for request-level failures,
    /// `stack` for failures caught by the worker's top-level handler.
    Error {
        error: String,
        #[serde(rename = "fileName", skip_serializing_if = "Option::is_none")]
        file_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        stack: Option<String>,
    },
    /// Cleanup finished.
    Cleaned,
}

/// Rejection produced when validating a raw message at the channel boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown message command: {0}")]
    UnknownCommand(String),
    #[error("message has no command field")]
    MissingCommand,
    #[error("malformed {command} command: {detail}")]
    Malformed { command: String, detail: String },
}

/// Validate a raw channel message into a [`WorkerCommand`].
///
/// A recognizable command name with bad fields is reported as malformed; an
/// unrecognized name is reported by name so the sender can be told exactly
/// which command was refused.
pub fn decode_command(raw: Value) -> Result<WorkerCommand, ProtocolError> {
    let name = match raw.get("cmd").and_then(Value::as_str) {
        Some(name) => name.to_owned(),
        None => return Err(ProtocolError::MissingCommand),
    };

    serde_json::from_value(raw).map_err(|err| {
        if matches!(name.as_str(), "convert" | "cleanup") {
            ProtocolError::Malformed {
                command: name,
                detail: err.to_string(),
            }
        } else {
            ProtocolError::UnknownCommand(name)
        }
    })
}
