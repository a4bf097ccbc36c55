//! Temp directory where uploads land before they are committed.

use super::disk;
use std::io;
use std::path::{Path, PathBuf};

/// An upload written to the temp directory, waiting to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// File name as sent by the client
    pub original_name: String,
    /// Where the bytes currently are
    pub staged_path: PathBuf,
}

/// Hands out staging paths inside the temp directory.
#[derive(Debug, Clone)]
pub struct TempStore {
    dir: PathBuf,
}

impl TempStore {
    /// Create the temp directory if needed and drop any leftovers from a
    /// previous run.
    pub fn open(dir: &Path) -> io::Result<Self> {
        disk::ensure_dir(dir)?;
        let dir = disk::absolute(dir)?;
        disk::clear_dir(&dir)?;
        Ok(Self { dir })
    }

    #[cfg(test)]
    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    /// A fresh path for an incoming upload. Nothing is created on disk.
    pub fn allocate(&self) -> PathBuf {
        self.dir.join(uuid::Uuid::new_v4().to_string())
    }
}
