/**
 * File Routes
 * Storage proxy for the admin media library
 */
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResult, SuccessResponse};
use crate::routes::auth::AdminSession;
use crate::state::AppState;
use crate::storage::{RenameOutcome, StorageUsage, StoredFile, UploadedFile};

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<StoredFile>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteFileRequest {
    pub key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameFileRequest {
    pub old_key: String,
    pub new_name: String,
}

fn multipart_error(e: MultipartError) -> ApiError {
    tracing::warn!("Multipart error: {}", e.body_text());
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("File exceeds the upload limit".to_string())
    } else {
        ApiError::bad_request("Invalid multipart data")
    }
}

/// POST /api/upload - Multipart field `file`
pub async fn upload(
    _session: AdminSession,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadedFile>)> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        let uploaded = state
            .files
            .upload(&file_name, content_type.as_deref(), bytes)
            .await?;
        return Ok((StatusCode::CREATED, Json(uploaded)));
    }
    Err(ApiError::bad_request("No file provided"))
}

/// GET /api/list-files
pub async fn list_files(
    _session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<Json<FileListResponse>> {
    Ok(Json(FileListResponse {
        files: state.files.list().await?,
    }))
}

/// DELETE /api/delete-file
pub async fn delete_file(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(payload): Json<DeleteFileRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    state.files.delete(&payload.key).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/rename-file
/// Copies the object to a slugged key, deletes the old one and rewrites
/// stored references. Not atomic.
pub async fn rename_file(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(payload): Json<RenameFileRequest>,
) -> ApiResult<Json<RenameOutcome>> {
    Ok(Json(
        state
            .files
            .rename(&payload.old_key, &payload.new_name)
            .await?,
    ))
}

/// GET /api/storage-usage
pub async fn storage_usage(
    _session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<Json<StorageUsage>> {
    Ok(Json(state.files.usage().await?))
}
