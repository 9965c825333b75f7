//! File and folder handlers, addressed by owner path or by id.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use docvault_core::types::{ResourceId, UserId};
use docvault_database::DeleteSummary;
use docvault_entity::resource::Resource;
use docvault_service::{Browse, NewFile, ResourceRef};

use crate::dto::ApiResponse;
use crate::dto::request::{CreateFolderRequest, NameRequest, PathQuery, UploadFileRequest};
use crate::error::ApiError;
use crate::extractors::Caller;
use crate::state::AppState;

/// GET /api/fs/{owner_id}?path=
pub async fn browse_path(
    State(state): State<AppState>,
    caller: Caller,
    Path(owner_id): Path<UserId>,
    Query(query): Query<PathQuery>,
) -> Result<Json<ApiResponse<Browse>>, ApiError> {
    let target = ResourceRef::path(owner_id, query.path);
    let browse = state.access.browse(&caller.credential(), &target).await?;
    Ok(Json(ApiResponse::ok(browse)))
}

/// POST /api/fs/{owner_id}/folders
pub async fn create_folder_at_path(
    State(state): State<AppState>,
    caller: Caller,
    Path(owner_id): Path<UserId>,
    Json(req): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Resource>>), ApiError> {
    let parent = ResourceRef::path(owner_id, req.path);
    let folder = state
        .access
        .create_folder(&caller.credential(), &parent, &req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(folder))))
}

/// POST /api/fs/{owner_id}/files
pub async fn upload_file_at_path(
    State(state): State<AppState>,
    caller: Caller,
    Path(owner_id): Path<UserId>,
    Json(req): Json<UploadFileRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Resource>>), ApiError> {
    let parent = ResourceRef::path(owner_id, req.path);
    let file = NewFile {
        name: req.name,
        mime_type: req.mime_type,
        size_bytes: req.size_bytes,
    };
    let stored = state
        .access
        .upload_file(&caller.credential(), &parent, file)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(stored))))
}

/// GET /api/resources/{id}
pub async fn get_resource(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ResourceId>,
) -> Result<Json<ApiResponse<Browse>>, ApiError> {
    let browse = state
        .access
        .browse(&caller.credential(), &ResourceRef::id(id))
        .await?;
    Ok(Json(ApiResponse::ok(browse)))
}

/// POST /api/resources/{id}/folders
pub async fn create_folder(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ResourceId>,
    Json(req): Json<NameRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Resource>>), ApiError> {
    let folder = state
        .access
        .create_folder(&caller.credential(), &ResourceRef::id(id), &req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(folder))))
}

/// POST /api/resources/{id}/files
pub async fn upload_file(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ResourceId>,
    Json(file): Json<NewFile>,
) -> Result<(StatusCode, Json<ApiResponse<Resource>>), ApiError> {
    let stored = state
        .access
        .upload_file(&caller.credential(), &ResourceRef::id(id), file)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(stored))))
}

/// PATCH /api/resources/{id}
pub async fn rename_resource(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ResourceId>,
    Json(req): Json<NameRequest>,
) -> Result<Json<ApiResponse<Resource>>, ApiError> {
    let renamed = state
        .access
        .rename(&caller.credential(), &ResourceRef::id(id), &req.name)
        .await?;
    Ok(Json(ApiResponse::ok(renamed)))
}

/// DELETE /api/resources/{id}
pub async fn delete_resource(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ResourceId>,
) -> Result<Json<ApiResponse<DeleteSummary>>, ApiError> {
    let summary = state
        .access
        .delete(&caller.credential(), &ResourceRef::id(id))
        .await?;
    Ok(Json(ApiResponse::ok(summary)))
}
