//! Filesystem mirror: keeps the node tree, the registry and the asset
//! directory consistent.

pub mod disk;
pub mod error;
pub mod manager;
pub mod naming;
pub mod staging;

pub use error::DriveError;
pub use manager::FileManager;
pub use staging::{StagedFile, TempStore};
