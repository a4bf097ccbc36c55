//! Folder rooms: which live connections watch which folder.

use super::connection::{ConnectionId, WsConnection};
use super::protocol;
use crate::drive::{DriveError, FileManager};
use crate::node::NodeId;
use std::collections::HashMap;

/// Error from room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The connection is not registered under the folder it claims to watch
    #[error("connection {conn_id} is not watching folder {folder_id}")]
    NotSubscribed {
        conn_id: ConnectionId,
        folder_id: NodeId,
    },
    /// Nobody watches this folder
    #[error("folder {0} not found")]
    FolderNotFound(NodeId),
    #[error(transparent)]
    Drive(#[from] DriveError),
    #[error("failed to encode listing: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Subscription table from folder id to the connections watching it.
///
/// A connection sits in exactly one room at a time, and a room with no
/// connections left is dropped.
#[derive(Debug, Default)]
pub struct RoomManager {
    rooms: HashMap<NodeId, HashMap<ConnectionId, WsConnection>>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection under its folder and send it the folder's
    /// current listing.
    pub fn subscribe(&mut self, conn: WsConnection, files: &FileManager) -> Result<(), RoomError> {
        let payload = Self::render(conn.folder_id, files)?;
        conn.try_send_text(payload);
        self.rooms
            .entry(conn.folder_id)
            .or_default()
            .insert(conn.id.clone(), conn);
        Ok(())
    }

    /// Move a connection from `from` to `to` and send it the new listing.
    ///
    /// The table is left untouched when the connection is not in `from` or
    /// when `to` cannot be listed.
    pub fn change_folder(
        &mut self,
        conn_id: &str,
        from: NodeId,
        to: NodeId,
        files: &FileManager,
    ) -> Result<(), RoomError> {
        let watching = self
            .rooms
            .get(&from)
            .is_some_and(|room| room.contains_key(conn_id));
        if !watching {
            return Err(RoomError::NotSubscribed {
                conn_id: conn_id.to_string(),
                folder_id: from,
            });
        }
        let payload = Self::render(to, files)?;

        let mut conn = self.take(conn_id, from)?;
        conn.folder_id = to;
        conn.try_send_text(payload);
        self.rooms
            .entry(to)
            .or_default()
            .insert(conn.id.clone(), conn);
        Ok(())
    }

    /// Remove a connection from the folder it watches.
    pub fn unsubscribe(&mut self, conn_id: &str, folder_id: NodeId) -> Result<WsConnection, RoomError> {
        self.take(conn_id, folder_id)
    }

    /// Send the folder's current listing to everyone watching it.
    ///
    /// Returns how many connections accepted the message. Broadcasting to a
    /// folder nobody watches is an error.
    pub fn broadcast(&self, folder_id: NodeId, files: &FileManager) -> Result<usize, RoomError> {
        let room = self
            .rooms
            .get(&folder_id)
            .ok_or(RoomError::FolderNotFound(folder_id))?;

        let payload = Self::render(folder_id, files)?;
        Ok(room
            .values()
            .filter(|conn| conn.try_send_text(payload.clone()))
            .count())
    }

    /// Number of connections watching a folder.
    pub fn watcher_count(&self, folder_id: NodeId) -> usize {
        self.rooms.get(&folder_id).map_or(0, HashMap::len)
    }

    /// Number of folders with at least one watcher.
    #[cfg(test)]
    pub(crate) fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn take(&mut self, conn_id: &str, folder_id: NodeId) -> Result<WsConnection, RoomError> {
        let room = self
            .rooms
            .get_mut(&folder_id)
            .ok_or(RoomError::FolderNotFound(folder_id))?;
        let conn = room.remove(conn_id).ok_or_else(|| RoomError::NotSubscribed {
            conn_id: conn_id.to_string(),
            folder_id,
        })?;
        if room.is_empty() {
            self.rooms.remove(&folder_id);
        }
        Ok(conn)
    }

    fn render(folder_id: NodeId, files: &FileManager) -> Result<String, RoomError> {
        let listing = files.read_folder(folder_id)?;
        Ok(protocol::encode_listing(&listing)?)
    }
}
