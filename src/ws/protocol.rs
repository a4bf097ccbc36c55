//! Messages exchanged with folder watchers.
//!
//! Server to client: a folder listing, as the JSON array produced by
//! [`encode_listing`].
//!
//! Client to server: `{"action": "change_folder", "id": <folder id>}`. The id
//! may be a whole number (`2` or `2.0`) or a numeric string. Any other action is ignored.

use crate::node::{NodeId, NodeSummary};
use serde::Deserialize;

/// Action name for moving a watcher to another folder.
pub const ACTION_CHANGE_FOLDER: &str = "change_folder";

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid folder id: {0}")]
    InvalidId(String),
}

/// A decoded client message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    ChangeFolder { id: NodeId },
    /// Unknown action, kept for logging
    Other { action: String },
}

#[derive(Deserialize)]
struct RawMessage {
    action: String,
    #[serde(default)]
    id: Option<serde_json::Value>,
}

/// Decode a text frame from a client.
pub fn decode_message(text: &str) -> Result<ClientMessage, ProtocolError> {
    let raw: RawMessage = serde_json::from_str(text)?;

    if raw.action != ACTION_CHANGE_FOLDER {
        return Ok(ClientMessage::Other { action: raw.action });
    }

    let id = match raw.id {
        Some(serde_json::Value::Number(n)) => n.as_u64().or_else(|| whole_number(n.as_f64()?)),
        Some(serde_json::Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
    .ok_or_else(|| ProtocolError::InvalidId(text.to_string()))?;

    Ok(ClientMessage::ChangeFolder { id: NodeId(id) })
}

fn whole_number(value: f64) -> Option<u64> {
    (value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64).then_some(value as u64)
}

/// Encode a folder listing for the wire.
pub fn encode_listing(listing: &[NodeSummary]) -> Result<String, serde_json::Error> {
    serde_json::to_string(listing)
}
