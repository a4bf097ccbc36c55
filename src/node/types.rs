use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// A unique identifier for a node in the mirrored tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out node ids for one registry.
///
/// Ids start at zero and only ever grow, so a freed id is never handed out
/// again for the lifetime of the allocator.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next unused id.
    pub fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

/// Download lock state of a file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileEntry {
    lock_count: u32,
}

impl FileEntry {
    pub fn is_locked(&self) -> bool {
        self.lock_count > 0
    }

    #[cfg(test)]
    pub(crate) fn lock_count(&self) -> u32 {
        self.lock_count
    }

    pub fn add_lock(&mut self) {
        self.lock_count += 1;
    }

    /// Release one lock. Releasing an unlocked file does nothing.
    pub fn release_lock(&mut self) {
        self.lock_count = self.lock_count.saturating_sub(1);
    }
}

/// Children of a folder, kept in id order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    children: BTreeSet<NodeId>,
}

impl FolderEntry {
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().copied()
    }

    pub(crate) fn insert(&mut self, id: NodeId) {
        self.children.insert(id);
    }

    pub(crate) fn remove(&mut self, id: NodeId) -> bool {
        self.children.remove(&id)
    }
}

/// Kind-specific payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    File(FileEntry),
    Folder(FolderEntry),
    /// The folder bound to the asset directory
    Root(FolderEntry),
}

/// A file or folder mirrored from disk.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) path: PathBuf,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning folder. `None` only for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Absolute on-disk path, fixed at construction.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File(_))
    }

    /// True for both plain folders and the root.
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder(_) | NodeKind::Root(_))
    }

    pub fn as_file_mut(&mut self) -> Option<&mut FileEntry> {
        match &mut self.kind {
            NodeKind::File(file) => Some(file),
            NodeKind::Folder(_) | NodeKind::Root(_) => None,
        }
    }

    pub fn as_folder(&self) -> Option<&FolderEntry> {
        match &self.kind {
            NodeKind::Folder(folder) | NodeKind::Root(folder) => Some(folder),
            NodeKind::File(_) => None,
        }
    }

    pub(crate) fn as_folder_mut(&mut self) -> Option<&mut FolderEntry> {
        match &mut self.kind {
            NodeKind::Folder(folder) | NodeKind::Root(folder) => Some(folder),
            NodeKind::File(_) => None,
        }
    }
}
