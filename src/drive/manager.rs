use super::disk;
use super::error::{DriveError, Result};
use super::naming::{resolve_store_name, split_extension};
use super::staging::{StagedFile, TempStore};
use crate::node::{FolderInfo, NodeId, NodeRegistry, NodeSummary};
use std::path::{Path, PathBuf};

/// Keeps the in-memory tree, the registry and the asset directory in step.
///
/// The tree is a snapshot taken when the manager is opened. Changes made to
/// the asset directory by anything other than this manager are not noticed.
#[derive(Debug)]
pub struct FileManager {
    registry: NodeRegistry,
    root: NodeId,
    temp: TempStore,
}

impl FileManager {
    /// Prepare the asset and temp directories, empty the temp directory and
    /// mirror the asset directory.
    pub fn open(asset_dir: &Path, temp_dir: &Path) -> Result<Self> {
        disk::ensure_dir(asset_dir)?;
        let temp = TempStore::open(temp_dir)?;

        let mut registry = NodeRegistry::new();
        let root = registry.create_root(disk::absolute(asset_dir)?)?;

        Ok(Self {
            registry,
            root,
            temp,
        })
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn temp_store(&self) -> &TempStore {
        &self.temp
    }

    // ========================================================================
    // Folders
    // ========================================================================

    /// Immediate children of a folder.
    pub fn read_folder(&self, id: NodeId) -> Result<Vec<NodeSummary>> {
        self.registry.listing(id)
    }

    pub fn folder_info(&self, id: NodeId) -> Result<FolderInfo> {
        self.registry.folder_info(id)
    }

    /// Create a subfolder, renaming it if the name is taken.
    pub fn add_folder(&mut self, parent_id: NodeId, name: &str) -> Result<FolderInfo> {
        let parent_path = self.registry.folder(parent_id)?.path().to_path_buf();

        let folder_name = resolve_store_name(&parent_path, name, None);
        disk::create_dir(&parent_path.join(&folder_name))?;
        let id = self.registry.create_folder(parent_id, folder_name)?;

        self.registry.folder_info(id)
    }

    // ========================================================================
    // Files
    // ========================================================================

    pub fn file_path(&self, id: NodeId) -> Result<PathBuf> {
        Ok(self.registry.file(id)?.path().to_path_buf())
    }

    pub fn add_file_lock(&mut self, id: NodeId) -> Result<()> {
        self.registry.file_mut(id)?.add_lock();
        Ok(())
    }

    pub fn release_file_lock(&mut self, id: NodeId) -> Result<()> {
        self.registry.file_mut(id)?.release_lock();
        Ok(())
    }

    /// Move a staged upload into a folder and start tracking it.
    ///
    /// Returns the name the file was stored under.
    pub fn commit_upload(&mut self, staged: StagedFile, folder_id: NodeId) -> Result<String> {
        let folder_path = self.registry.folder(folder_id)?.path().to_path_buf();

        let (base, ext) = split_extension(&staged.original_name);
        let file_name = resolve_store_name(&folder_path, base, ext);

        disk::move_file(&staged.staged_path, &folder_path.join(&file_name))?;
        self.registry.create_file(folder_id, file_name.clone())?;

        Ok(file_name)
    }

    // ========================================================================
    // Any node
    // ========================================================================

    pub fn check_lock(&self, id: NodeId) -> Result<bool> {
        self.registry.is_locked(id)
    }

    /// Id of the folder containing `id`.
    pub fn folder_id_of(&self, id: NodeId) -> Result<NodeId> {
        let node = self.registry.get(id)?;
        node.parent()
            .ok_or_else(|| DriveError::NoParent(node.name().to_string()))
    }

    /// Delete a file or a whole folder from memory and disk.
    ///
    /// Nothing is touched if the node or anything below it is locked. The
    /// node is unlinked from its parent before the disk removal and purged
    /// from the registry after it.
    pub fn delete(&mut self, id: NodeId) -> Result<()> {
        let node = self.registry.get(id)?;
        if self.registry.is_locked(id)? {
            return Err(DriveError::Locked(node.name().to_string()));
        }
        let path = node.path().to_path_buf();
        let is_dir = node.is_folder();
        let subtree = self.registry.subtree(id)?;

        self.registry.detach(id)?;
        disk::remove(&path, is_dir)?;
        self.registry.purge(&subtree);

        Ok(())
    }
}
