use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use crate::drive::{DriveError, StagedFile};
use crate::node::{FolderInfo, NodeId, NodeSummary};
use crate::services::drive::discard_staged;
use crate::services::{DriveService, ServiceError};
use crate::ws::room::RoomError;

/// Multipart field carrying an upload.
const UPLOAD_FIELD: &str = "file";

#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<DriveService>,
}

fn drive_status(e: &DriveError) -> StatusCode {
    match e {
        DriveError::NotFound(_) => StatusCode::NOT_FOUND,
        DriveError::WrongKind { .. } | DriveError::NoParent(_) => StatusCode::BAD_REQUEST,
        DriveError::Locked(_) => StatusCode::CONFLICT,
        DriveError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ServiceError {
    /// Convert a ServiceError to an HTTP StatusCode.
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Drive(e) | ServiceError::Room(RoomError::Drive(e)) => drive_status(e),
            ServiceError::Room(RoomError::FolderNotFound(_)) => StatusCode::NOT_FOUND,
            ServiceError::Room(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}

pub fn router(service: Arc<DriveService>) -> Router {
    let state = ApiState { service };

    Router::new()
        .route("/root", get(get_root))
        // Folder endpoints
        .route("/folders/:id", get(list_folder))
        .route("/folders/:id/info", get(get_folder_info))
        .route("/folders/:id/folders", post(create_folder))
        .route(
            "/folders/:id/files",
            post(upload_file).layer(DefaultBodyLimit::disable()),
        )
        // File endpoints
        .route("/files/:id/download", get(download_file))
        // Endpoints accepting any node
        .route("/nodes/:id", delete(delete_node))
        .route("/nodes/:id/lock", get(get_lock))
        .route("/nodes/:id/parent", get(get_parent))
        .with_state(state)
}

// ============================================================================
// Folder endpoints
// ============================================================================

async fn get_root(State(state): State<ApiState>) -> Result<Json<FolderInfo>, ServiceError> {
    Ok(Json(state.service.run(|s| s.root_info()).await?))
}

async fn list_folder(
    State(state): State<ApiState>,
    Path(id): Path<NodeId>,
) -> Result<Json<Vec<NodeSummary>>, ServiceError> {
    Ok(Json(state.service.run(move |s| s.read_folder(id)).await?))
}

async fn get_folder_info(
    State(state): State<ApiState>,
    Path(id): Path<NodeId>,
) -> Result<Json<FolderInfo>, ServiceError> {
    Ok(Json(state.service.run(move |s| s.folder_info(id)).await?))
}

#[derive(Deserialize)]
struct CreateFolderRequest {
    name: String,
}

async fn create_folder(
    State(state): State<ApiState>,
    Path(parent_id): Path<NodeId>,
    Json(req): Json<CreateFolderRequest>,
) -> Result<Json<FolderInfo>, ServiceError> {
    if req.name.trim().is_empty() {
        return Err(ServiceError::InvalidInput(
            "folder name must not be empty".to_string(),
        ));
    }

    let folder = state
        .service
        .run(move |s| s.add_folder(parent_id, &req.name))
        .await?;
    Ok(Json(folder))
}

#[derive(Serialize)]
struct UploadResponse {
    file_nm: String,
}

/// Store an uploaded file in a folder.
///
/// The `file` field is streamed to the temp directory before being moved
/// into place, so uploads are never buffered in memory.
async fn upload_file(
    State(state): State<ApiState>,
    Path(folder_id): Path<NodeId>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ServiceError> {
    state.service.run(move |s| s.folder_info(folder_id)).await?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::InvalidInput(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let original_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(ServiceError::InvalidInput(
                    "upload has no file name".to_string(),
                ))
            }
        };

        let staged_path = state.service.run(|s| Ok(s.staging_path())).await?;
        if let Err(e) = stage_field(field, &staged_path).await {
            discard_staged(&staged_path);
            return Err(e);
        }

        let staged = StagedFile {
            original_name,
            staged_path,
        };
        let file_nm = state
            .service
            .run(move |s| s.commit_upload(staged, folder_id))
            .await?;
        return Ok(Json(UploadResponse { file_nm }));
    }

    Err(ServiceError::InvalidInput(format!(
        "missing multipart field '{}'",
        UPLOAD_FIELD
    )))
}

async fn stage_field(
    mut field: axum::extract::multipart::Field<'_>,
    path: &std::path::Path,
) -> Result<(), ServiceError> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(DriveError::from)?;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ServiceError::InvalidInput(e.to_string()))?
    {
        file.write_all(&chunk).await.map_err(DriveError::from)?;
    }
    file.flush().await.map_err(DriveError::from)?;

    Ok(())
}

// ============================================================================
// File endpoints
// ============================================================================

/// Stream a file as an attachment.
///
/// The file stays locked until the body has been fully sent or the client
/// goes away.
async fn download_file(
    State(state): State<ApiState>,
    Path(id): Path<NodeId>,
) -> Result<Response, ServiceError> {
    let lock = state.service.run(move |s| s.lock_download(id)).await?;
    let file = tokio::fs::File::open(lock.path())
        .await
        .map_err(DriveError::from)?;
    let len = file.metadata().await.map_err(DriveError::from)?.len();

    let name = lock
        .path()
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download")
        .to_string();
    let disposition = format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(&name)
    );

    let stream = ReaderStream::new(file).map(move |chunk| {
        let _held = &lock;
        chunk
    });

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_LENGTH, len.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

// ============================================================================
// Node endpoints
// ============================================================================

async fn delete_node(
    State(state): State<ApiState>,
    Path(id): Path<NodeId>,
) -> Result<StatusCode, ServiceError> {
    state.service.run(move |s| s.delete(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_lock(
    State(state): State<ApiState>,
    Path(id): Path<NodeId>,
) -> Result<Json<bool>, ServiceError> {
    Ok(Json(state.service.run(move |s| s.check_lock(id)).await?))
}

#[derive(Serialize)]
struct ParentResponse {
    id: NodeId,
}

async fn get_parent(
    State(state): State<ApiState>,
    Path(id): Path<NodeId>,
) -> Result<Json<ParentResponse>, ServiceError> {
    Ok(Json(ParentResponse {
        id: state.service.run(move |s| s.folder_id_of(id)).await?,
    }))
}
