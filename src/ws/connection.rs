//! Per-connection state for folder watchers.

use crate::node::NodeId;
use tokio::sync::mpsc;

/// Unique connection ID.
pub type ConnectionId = String;

/// Outgoing message to send to a WebSocket client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingMessage {
    /// JSON text frame (folder listings)
    Text(String),
}

/// A live connection watching one folder.
#[derive(Debug)]
pub struct WsConnection {
    /// Unique connection ID (server-generated UUID)
    pub id: ConnectionId,

    /// Folder this connection is watching
    pub folder_id: NodeId,

    /// Sender for outgoing messages to this connection
    pub sender: mpsc::Sender<OutgoingMessage>,
}

impl WsConnection {
    pub fn new(folder_id: NodeId, sender: mpsc::Sender<OutgoingMessage>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            folder_id,
            sender,
        }
    }

    /// Send a message to this connection (non-blocking).
    /// Returns false if the channel is full or closed.
    pub fn try_send(&self, msg: OutgoingMessage) -> bool {
        self.sender.try_send(msg).is_ok()
    }

    pub fn try_send_text(&self, text: String) -> bool {
        self.try_send(OutgoingMessage::Text(text))
    }
}
