//! Share link handlers: issue, inspect, revoke, and act through a token.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use docvault_core::types::ResourceId;
use docvault_database::DeleteSummary;
use docvault_entity::resource::Resource;
use docvault_entity::share::ShareToken;
use docvault_service::{Browse, Credential, NewFile, ResourceRef, ShareRequest};

use crate::dto::ApiResponse;
use crate::dto::request::NameRequest;
use crate::dto::response::Changed;
use crate::error::ApiError;
use crate::extractors::{Caller, SharePassword};
use crate::state::AppState;

/// POST /api/resources/{id}/shares
pub async fn issue_share(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ResourceId>,
    Json(req): Json<ShareRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ShareToken>>), ApiError> {
    let share = state
        .access
        .issue_share(&caller.credential(), &ResourceRef::id(id), req)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(share))))
}

/// GET /api/resources/{id}/shares
pub async fn list_shares(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ResourceId>,
) -> Result<Json<ApiResponse<Vec<ShareToken>>>, ApiError> {
    let shares = state
        .access
        .list_shares(&caller.credential(), &ResourceRef::id(id))
        .await?;
    Ok(Json(ApiResponse::ok(shares)))
}

/// GET /api/shares/{token}
pub async fn share_info(
    State(state): State<AppState>,
    Path(token): Path<String>,
    SharePassword(password): SharePassword,
) -> Result<Json<ApiResponse<Browse>>, ApiError> {
    let browse = state.access.share_info(&token, password.as_deref()).await?;
    Ok(Json(ApiResponse::ok(browse)))
}

/// DELETE /api/shares/{token}
pub async fn revoke_share(
    State(state): State<AppState>,
    caller: Caller,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<Changed>>, ApiError> {
    state
        .access
        .revoke_share(&caller.credential(), &token)
        .await?;
    Ok(Json(ApiResponse::ok(Changed { changed: true })))
}

/// GET /api/shares/{token}/resources/{id}
pub async fn browse_shared(
    State(state): State<AppState>,
    Path((token, id)): Path<(String, ResourceId)>,
    SharePassword(password): SharePassword,
) -> Result<Json<ApiResponse<Browse>>, ApiError> {
    let credential = Credential::share_token(token, password);
    let browse = state
        .access
        .browse(&credential, &ResourceRef::id(id))
        .await?;
    Ok(Json(ApiResponse::ok(browse)))
}

/// POST /api/shares/{token}/resources/{id}/folders
pub async fn create_shared_folder(
    State(state): State<AppState>,
    Path((token, id)): Path<(String, ResourceId)>,
    SharePassword(password): SharePassword,
    Json(req): Json<NameRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Resource>>), ApiError> {
    let credential = Credential::share_token(token, password);
    let folder = state
        .access
        .create_folder(&credential, &ResourceRef::id(id), &req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(folder))))
}

/// POST /api/shares/{token}/resources/{id}/files
pub async fn upload_shared_file(
    State(state): State<AppState>,
    Path((token, id)): Path<(String, ResourceId)>,
    SharePassword(password): SharePassword,
    Json(file): Json<NewFile>,
) -> Result<(StatusCode, Json<ApiResponse<Resource>>), ApiError> {
    let credential = Credential::share_token(token, password);
    let stored = state
        .access
        .upload_file(&credential, &ResourceRef::id(id), file)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(stored))))
}

/// PATCH /api/shares/{token}/resources/{id}
pub async fn rename_shared(
    State(state): State<AppState>,
    Path((token, id)): Path<(String, ResourceId)>,
    SharePassword(password): SharePassword,
    Json(req): Json<NameRequest>,
) -> Result<Json<ApiResponse<Resource>>, ApiError> {
    let credential = Credential::share_token(token, password);
    let renamed = state
        .access
        .rename(&credential, &ResourceRef::id(id), &req.name)
        .await?;
    Ok(Json(ApiResponse::ok(renamed)))
}

/// DELETE /api/shares/{token}/resources/{id}
pub async fn delete_shared(
    State(state): State<AppState>,
    Path((token, id)): Path<(String, ResourceId)>,
    SharePassword(password): SharePassword,
) -> Result<Json<ApiResponse<DeleteSummary>>, ApiError> {
    let credential = Credential::share_token(token, password);
    let summary = state
        .access
        .delete(&credential, &ResourceRef::id(id))
        .await?;
    Ok(Json(ApiResponse::ok(summary)))
}
