//! Service layer for business logic.
//!
//! This module provides service types that encapsulate business logic,
//! separating it from HTTP and WebSocket handler concerns.

pub mod drive;

pub use drive::{DownloadLock, DriveService, ServiceError};
