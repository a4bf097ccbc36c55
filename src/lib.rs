pub mod api;
pub mod cli;
pub mod drive;
pub mod node;
pub mod services;
pub mod ws;

use axum::{routing::get, Router};
use drive::{DriveError, FileManager};
use services::DriveService;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

async fn health_check() -> &'static str {
    "OK"
}

/// Configuration for creating a router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Directory whose contents are served
    pub asset_dir: PathBuf,
    /// Directory where uploads are staged; emptied at startup
    pub temp_dir: PathBuf,
    /// Built frontend served for every path no route matches
    pub static_dir: Option<PathBuf>,
}

/// Create a router with the given configuration.
///
/// Scans the asset directory into memory and prepares the temp directory.
pub fn create_router_with_config(config: RouterConfig) -> Result<Router, DriveError> {
    let files = FileManager::open(&config.asset_dir, &config.temp_dir)?;
    tracing::info!(
        asset_dir = %config.asset_dir.display(),
        nodes = files.registry().len(),
        "Loaded asset directory"
    );

    let service = Arc::new(DriveService::new(files));
    Ok(create_router(service, config.static_dir))
}

/// Create a router over an existing service.
pub fn create_router(service: Arc<DriveService>, static_dir: Option<PathBuf>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health_check))
        .merge(api::router(service.clone()))
        .merge(ws::router(service));

    if let Some(dir) = static_dir {
        tracing::info!("Serving static files from {}", dir.display());
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
