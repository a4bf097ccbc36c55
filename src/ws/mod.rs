//! WebSocket module for live folder listings.
//!
//! Provides the endpoint `/ws/folders/{id}`. A connection receives the
//! listing of the folder it watches on connect and after every change to
//! that folder, and may move to another folder with a `change_folder`
//! message.

pub mod connection;
pub mod handler;
pub mod protocol;
pub mod room;

use crate::services::DriveService;
use axum::routing::get;
use axum::Router;
use handler::WsState;
use std::sync::Arc;

/// Create the WebSocket router.
pub fn router(service: Arc<DriveService>) -> Router {
    let state = WsState { service };

    Router::new()
        .route("/ws/folders/:id", get(handler::ws_handler))
        .with_state(state)
}
