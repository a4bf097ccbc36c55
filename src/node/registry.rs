use super::summary::{FileSummary, FolderInfo, NodeSummary, NodeType, PathCrumb};
use super::types::{FileEntry, FolderEntry, IdAllocator, Node, NodeId, NodeKind};
use super::ROOT_NAME;
use crate::drive::disk;
use crate::drive::error::{DriveError, Result};
use std::collections::HashMap;
use std::path::PathBuf;

/// Arena owning every tracked node.
///
/// A node is present here iff it is reachable from the root through folder
/// children. Only the registry creates or destroys nodes, and it keeps the
/// parent's child set in step with the arena.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: HashMap<NodeId, Node>,
    ids: IdAllocator,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the root folder for `path` and materialize everything below it.
    pub fn create_root(&mut self, path: PathBuf) -> Result<NodeId> {
        let id = self.ids.allocate();
        self.nodes.insert(
            id,
            Node {
                id,
                name: ROOT_NAME.to_string(),
                parent: None,
                path,
                kind: NodeKind::Root(FolderEntry::default()),
            },
        );
        self.materialize(id)?;
        Ok(id)
    }

    /// Create a folder under `parent` and materialize its on-disk contents.
    pub fn create_folder(&mut self, parent: NodeId, name: impl Into<String>) -> Result<NodeId> {
        let id = self.insert_child(parent, name.into(), NodeKind::Folder(FolderEntry::default()))?;
        self.materialize(id)?;
        Ok(id)
    }

    /// Create an unlocked file under `parent`.
    pub fn create_file(&mut self, parent: NodeId, name: impl Into<String>) -> Result<NodeId> {
        self.insert_child(parent, name.into(), NodeKind::File(FileEntry::default()))
    }

    fn insert_child(&mut self, parent: NodeId, name: String, kind: NodeKind) -> Result<NodeId> {
        let path = self.folder(parent)?.path.join(&name);
        let id = self.ids.allocate();

        if let Some(folder) = self
            .nodes
            .get_mut(&parent)
            .and_then(|node| node.as_folder_mut())
        {
            folder.insert(id);
        }
        self.nodes.insert(
            id,
            Node {
                id,
                name,
                parent: Some(parent),
                path,
                kind,
            },
        );
        Ok(id)
    }

    /// Scan the directory behind `folder` once, creating a node per entry and
    /// descending into subdirectories.
    fn materialize(&mut self, folder: NodeId) -> Result<()> {
        let mut pending = vec![folder];
        while let Some(current) = pending.pop() {
            let path = self.folder(current)?.path.clone();
            for entry in disk::list_dir(&path)? {
                if entry.is_dir {
                    let id = self.insert_child(
                        current,
                        entry.name,
                        NodeKind::Folder(FolderEntry::default()),
                    )?;
                    pending.push(id);
                } else {
                    self.create_file(current, entry.name)?;
                }
            }
        }
        Ok(())
    }

    // --- Lookup ---

    pub fn get(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(DriveError::NotFound(id))
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Look up a node that must be a file.
    pub fn file(&self, id: NodeId) -> Result<&Node> {
        let node = self.get(id)?;
        if node.is_file() {
            Ok(node)
        } else {
            Err(DriveError::WrongKind {
                id,
                expected: "file",
            })
        }
    }

    pub fn file_mut(&mut self, id: NodeId) -> Result<&mut FileEntry> {
        self.nodes
            .get_mut(&id)
            .ok_or(DriveError::NotFound(id))?
            .as_file_mut()
            .ok_or(DriveError::WrongKind {
                id,
                expected: "file",
            })
    }

    /// Look up a node that must be a folder (or the root).
    pub fn folder(&self, id: NodeId) -> Result<&Node> {
        let node = self.get(id)?;
        if node.is_folder() {
            Ok(node)
        } else {
            Err(DriveError::WrongKind {
                id,
                expected: "folder",
            })
        }
    }

    /// Immediate children of a folder, in id order.
    pub fn children(&self, id: NodeId) -> Result<Vec<&Node>> {
        let folder = self.folder(id)?;
        Ok(folder
            .as_folder()
            .into_iter()
            .flat_map(|folder| folder.children())
            .filter_map(|child| self.nodes.get(&child))
            .collect())
    }

    #[cfg(test)]
    pub(crate) fn files_in(&self, id: NodeId) -> Result<Vec<&Node>> {
        Ok(self
            .children(id)?
            .into_iter()
            .filter(|node| node.is_file())
            .collect())
    }

    #[cfg(test)]
    pub(crate) fn folders_in(&self, id: NodeId) -> Result<Vec<&Node>> {
        Ok(self
            .children(id)?
            .into_iter()
            .filter(|node| node.is_folder())
            .collect())
    }

    /// Ids of `id` and all its descendants.
    pub fn subtree(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.get(id)?;
        let mut found = Vec::new();
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            found.push(current);
            if let Some(folder) = self.nodes.get(&current).and_then(Node::as_folder) {
                pending.extend(folder.children());
            }
        }
        Ok(found)
    }

    // --- Lock state ---

    /// A file is locked while its counter is positive; a folder is locked
    /// while any file below it is.
    pub fn is_locked(&self, id: NodeId) -> Result<bool> {
        let mut pending = vec![self.get(id)?];
        while let Some(node) = pending.pop() {
            match &node.kind {
                NodeKind::File(file) => {
                    if file.is_locked() {
                        return Ok(true);
                    }
                }
                NodeKind::Folder(folder) | NodeKind::Root(folder) => {
                    pending.extend(folder.children().filter_map(|child| self.nodes.get(&child)));
                }
            }
        }
        Ok(false)
    }

    // --- Removal ---

    /// Unlink `id` from its parent's children. The node itself stays in the
    /// arena until [`purge`](Self::purge).
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        let node = self.get(id)?;
        let parent = node
            .parent
            .ok_or_else(|| DriveError::NoParent(node.name.clone()))?;
        if let Some(folder) = self
            .nodes
            .get_mut(&parent)
            .and_then(|node| node.as_folder_mut())
        {
            folder.remove(id);
        }
        Ok(())
    }

    /// Drop nodes from the arena.
    pub fn purge(&mut self, ids: &[NodeId]) {
        for id in ids {
            self.nodes.remove(id);
        }
    }

    // --- Descriptors ---

    /// Folders from the root down to and including `id`.
    pub fn breadcrumb(&self, id: NodeId) -> Result<Vec<PathCrumb>> {
        let mut crumbs = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            let node = self.get(id)?;
            crumbs.push(PathCrumb {
                id: node.id,
                name: node.name.clone(),
            });
            current = node.parent;
        }
        crumbs.reverse();
        Ok(crumbs)
    }

    pub fn folder_info(&self, id: NodeId) -> Result<FolderInfo> {
        let folder = self.folder(id)?;
        Ok(FolderInfo {
            id,
            name: folder.name.clone(),
            node_type: NodeType::Folder,
            path: self.breadcrumb(id)?,
        })
    }

    pub fn summary(&self, id: NodeId) -> Result<NodeSummary> {
        let node = self.get(id)?;
        match &node.kind {
            NodeKind::File(file) => Ok(NodeSummary::File(FileSummary {
                id,
                name: node.name.clone(),
                node_type: NodeType::File,
                is_lock: file.is_locked(),
            })),
            NodeKind::Folder(_) | NodeKind::Root(_) => Ok(NodeSummary::Folder(self.folder_info(id)?)),
        }
    }

    /// Summaries of a folder's immediate children, in id order.
    pub fn listing(&self, id: NodeId) -> Result<Vec<NodeSummary>> {
        self.children(id)?
            .into_iter()
            .map(|child| self.summary(child.id))
            .collect()
    }
}
