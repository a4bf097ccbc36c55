//! Error types for the filesystem mirror.

use crate::node::NodeId;

/// Errors returned by [`FileManager`](super::FileManager) and the node registry.
#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    /// No node with this id is tracked
    #[error("object with id {0} does not exist")]
    NotFound(NodeId),

    /// The id resolves to a node of the wrong kind for the operation
    #[error("object with id {id} is not a {expected}")]
    WrongKind { id: NodeId, expected: &'static str },

    /// Delete refused because the node or one of its descendants is locked
    #[error("file object {0} is locked")]
    Locked(String),

    /// The node has no containing folder (it is the root)
    #[error("file object {0} is not in any folder")]
    NoParent(String),

    /// Disk failure, passed through untouched
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DriveError>;
