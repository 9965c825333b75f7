//! Grant management handlers.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use docvault_core::types::ResourceId;
use docvault_entity::permission::{Grant, Subject, SubjectKind};
use docvault_service::{GrantRequest, ResourceRef};

use crate::dto::ApiResponse;
use crate::dto::response::Changed;
use crate::error::ApiError;
use crate::extractors::Caller;
use crate::state::AppState;

/// GET /api/resources/{id}/grants
pub async fn list_grants(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ResourceId>,
) -> Result<Json<ApiResponse<Vec<Grant>>>, ApiError> {
    let grants = state
        .access
        .list_grants(&caller.credential(), &ResourceRef::id(id))
        .await?;
    Ok(Json(ApiResponse::ok(grants)))
}

/// PUT /api/resources/{id}/grants
pub async fn put_grant(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ResourceId>,
    Json(req): Json<GrantRequest>,
) -> Result<Json<ApiResponse<Grant>>, ApiError> {
    let grant = state
        .access
        .put_grant(&caller.credential(), &ResourceRef::id(id), req)
        .await?;
    Ok(Json(ApiResponse::ok(grant)))
}

/// DELETE /api/resources/{id}/grants/{kind}/{subject_id}
pub async fn revoke_grant(
    State(state): State<AppState>,
    caller: Caller,
    Path((id, kind, subject_id)): Path<(ResourceId, String, Uuid)>,
) -> Result<Json<ApiResponse<Changed>>, ApiError> {
    let kind: SubjectKind = kind.parse()?;
    state
        .access
        .revoke_grant(
            &caller.credential(),
            &ResourceRef::id(id),
            Subject::from_parts(kind, subject_id),
        )
        .await?;
    Ok(Json(ApiResponse::ok(Changed { changed: true })))
}
