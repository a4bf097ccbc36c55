//! Drive service layer.
//!
//! Owns the [`FileManager`] and the [`RoomManager`] behind one lock, so a
//! mutation and the broadcast it triggers run as a single step. HTTP and
//! WebSocket handlers only talk to this type.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::drive::{disk, DriveError, FileManager, StagedFile};
use crate::node::{FolderInfo, NodeId, NodeSummary};
use crate::ws::connection::WsConnection;
use crate::ws::room::{RoomError, RoomManager};

/// Errors that can occur in service operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Drive(#[from] DriveError),
    #[error(transparent)]
    Room(#[from] RoomError),
    /// Invalid input data
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A drive call on the blocking pool panicked or was cancelled
    #[error("drive task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

struct Drive {
    files: FileManager,
    rooms: RoomManager,
}

/// Service for drive operations.
pub struct DriveService {
    drive: Mutex<Drive>,
}

impl DriveService {
    pub fn new(files: FileManager) -> Self {
        Self {
            drive: Mutex::new(Drive {
                files,
                rooms: RoomManager::new(),
            }),
        }
    }

    /// Run a drive call on the blocking thread pool.
    ///
    /// Drive calls may block on the lock and on disk I/O; async callers use
    /// this rather than calling them on a runtime worker.
    pub async fn run<T, F>(self: &Arc<Self>, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&Arc<DriveService>) -> Result<T, ServiceError> + Send + 'static,
        T: Send + 'static,
    {
        let service = Arc::clone(self);
        tokio::task::spawn_blocking(move || f(&service)).await?
    }

    /// Lock the drive, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, Drive> {
        self.drive.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push a fresh listing of `folder_id` to its watchers.
    fn notify(drive: &Drive, folder_id: NodeId) {
        match drive.rooms.broadcast(folder_id, &drive.files) {
            Ok(delivered) => debug!(folder_id = %folder_id, delivered, "Broadcast folder listing"),
            Err(RoomError::FolderNotFound(_)) => {
                debug!(folder_id = %folder_id, "No watchers for folder, skipping broadcast")
            }
            Err(e) => warn!(folder_id = %folder_id, "Broadcast failed: {}", e),
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn root_id(&self) -> NodeId {
        self.lock().files.root_id()
    }

    pub fn root_info(&self) -> Result<FolderInfo, ServiceError> {
        let drive = self.lock();
        Ok(drive.files.folder_info(drive.files.root_id())?)
    }

    pub fn read_folder(&self, id: NodeId) -> Result<Vec<NodeSummary>, ServiceError> {
        Ok(self.lock().files.read_folder(id)?)
    }

    pub fn folder_info(&self, id: NodeId) -> Result<FolderInfo, ServiceError> {
        Ok(self.lock().files.folder_info(id)?)
    }

    pub fn check_lock(&self, id: NodeId) -> Result<bool, ServiceError> {
        Ok(self.lock().files.check_lock(id)?)
    }

    pub fn folder_id_of(&self, id: NodeId) -> Result<NodeId, ServiceError> {
        Ok(self.lock().files.folder_id_of(id)?)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Create a folder and refresh the parent's watchers.
    pub fn add_folder(&self, parent_id: NodeId, name: &str) -> Result<FolderInfo, ServiceError> {
        let mut drive = self.lock();
        let folder = drive.files.add_folder(parent_id, name)?;
        info!(parent_id = %parent_id, folder_id = %folder.id, name = %folder.name, "Added folder");
        Self::notify(&drive, parent_id);
        Ok(folder)
    }

    /// Delete a node and refresh the watchers of the folder that held it.
    ///
    /// Returns the id of that folder.
    pub fn delete(&self, id: NodeId) -> Result<NodeId, ServiceError> {
        let mut drive = self.lock();
        let parent_id = drive.files.folder_id_of(id)?;
        drive.files.delete(id)?;
        info!(id = %id, parent_id = %parent_id, "Deleted object");
        Self::notify(&drive, parent_id);
        Ok(parent_id)
    }

    /// A fresh path in the temp directory for an incoming upload.
    pub fn staging_path(&self) -> PathBuf {
        self.lock().files.temp_store().allocate()
    }

    /// Commit a staged upload into a folder and refresh its watchers.
    ///
    /// The staged file is removed if the commit fails.
    pub fn commit_upload(&self, staged: StagedFile, folder_id: NodeId) -> Result<String, ServiceError> {
        let staged_path = staged.staged_path.clone();
        let mut drive = self.lock();
        match drive.files.commit_upload(staged, folder_id) {
            Ok(name) => {
                info!(folder_id = %folder_id, name = %name, "Stored upload");
                Self::notify(&drive, folder_id);
                Ok(name)
            }
            Err(e) => {
                drop(drive);
                discard_staged(&staged_path);
                Err(e.into())
            }
        }
    }

    /// Lock a file for download. The lock is released when the returned
    /// guard is dropped.
    pub fn lock_download(self: &Arc<Self>, id: NodeId) -> Result<DownloadLock, ServiceError> {
        let mut drive = self.lock();
        let path = drive.files.file_path(id)?;
        drive.files.add_file_lock(id)?;
        debug!(id = %id, "Acquired download lock");
        Ok(DownloadLock {
            service: Arc::clone(self),
            id,
            path,
        })
    }

    fn release_download(&self, id: NodeId) {
        match self.lock().files.release_file_lock(id) {
            Ok(()) => debug!(id = %id, "Released download lock"),
            Err(e) => warn!(id = %id, "Failed to release download lock: {}", e),
        }
    }

    // ========================================================================
    // Watchers
    // ========================================================================

    /// Register a connection and send it the initial listing.
    pub fn watch(&self, conn: WsConnection) -> Result<(), ServiceError> {
        let mut drive = self.lock();
        let Drive { files, rooms } = &mut *drive;
        rooms.subscribe(conn, files)?;
        Ok(())
    }

    pub fn change_folder(&self, conn_id: &str, from: NodeId, to: NodeId) -> Result<(), ServiceError> {
        let mut drive = self.lock();
        let Drive { files, rooms } = &mut *drive;
        rooms.change_folder(conn_id, from, to, files)?;
        Ok(())
    }

    pub fn unwatch(&self, conn_id: &str, folder_id: NodeId) -> Result<(), ServiceError> {
        self.lock().rooms.unsubscribe(conn_id, folder_id)?;
        Ok(())
    }

    /// Number of connections watching a folder.
    pub fn watcher_count(&self, folder_id: NodeId) -> usize {
        self.lock().rooms.watcher_count(folder_id)
    }
}

/// Remove a staged upload that will not be committed.
pub fn discard_staged(path: &Path) {
    if let Err(e) = disk::remove(path, false) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), "Failed to remove staged upload: {}", e);
        }
    }
}

/// Download lock on a file, held for as long as the guard lives.
pub struct DownloadLock {
    service: Arc<DriveService>,
    id: NodeId,
    path: PathBuf,
}

impl DownloadLock {
    /// On-disk path of the locked file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DownloadLock {
    fn drop(&mut self) {
        self.service.release_download(self.id);
    }
}
