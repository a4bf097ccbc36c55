//! In-memory mirror of the asset directory.
//!
//! Nodes live in a [`NodeRegistry`] arena and refer to each other by
//! [`NodeId`]; the registry is their only owner.

pub mod registry;
pub mod summary;
pub mod types;

pub use registry::NodeRegistry;
pub use summary::{FileSummary, FolderInfo, NodeSummary, NodeType, PathCrumb};
pub use types::{FileEntry, FolderEntry, IdAllocator, Node, NodeId, NodeKind};

/// Display name of the root folder.
pub const ROOT_NAME: &str = "Root";
