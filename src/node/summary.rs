//! Serializable descriptors returned to clients.

use super::types::NodeId;
use serde::{Deserialize, Serialize};

/// Value of the `type` field in descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    File,
    Folder,
}

/// One step of a folder breadcrumb.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCrumb {
    pub id: NodeId,
    pub name: String,
}

/// A file as shown in a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub id: NodeId,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub is_lock: bool,
}

/// Full folder descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderInfo {
    pub id: NodeId,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Folders from the root down to and including this one
    pub path: Vec<PathCrumb>,
}

/// An entry of a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSummary {
    File(FileSummary),
    Folder(FolderInfo),
}

impl NodeSummary {
    pub fn id(&self) -> NodeId {
        match self {
            NodeSummary::File(file) => file.id,
            NodeSummary::Folder(folder) => folder.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            NodeSummary::File(file) => &file.name,
            NodeSummary::Folder(folder) => &folder.name,
        }
    }
}
