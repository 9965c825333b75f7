//! Group and role administration handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use docvault_core::types::{GroupId, RoleId, UserId};
use docvault_entity::directory::{Group, GroupMembership, Role};
use docvault_service::CreateRole;

use crate::dto::ApiResponse;
use crate::dto::request::{AssignRoleRequest, CreateGroupRequest, MembershipRequest};
use crate::dto::response::Changed;
use crate::error::ApiError;
use crate::extractors::Caller;
use crate::state::AppState;

/// GET /api/roles
pub async fn list_roles(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ApiResponse<Vec<Role>>>, ApiError> {
    let roles = state.directory.list_roles(&caller).await?;
    Ok(Json(ApiResponse::ok(roles)))
}

/// POST /api/roles
pub async fn create_role(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<CreateRole>,
) -> Result<(StatusCode, Json<ApiResponse<Role>>), ApiError> {
    let role = state.directory.create_role(&caller, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(role))))
}

/// GET /api/roles/me
pub async fn my_roles(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ApiResponse<Vec<Role>>>, ApiError> {
    let roles = state.directory.my_roles(&caller).await?;
    Ok(Json(ApiResponse::ok(roles)))
}

/// POST /api/roles/{role_id}/assignments
pub async fn assign_role(
    State(state): State<AppState>,
    caller: Caller,
    Path(role_id): Path<RoleId>,
    Json(req): Json<AssignRoleRequest>,
) -> Result<Json<ApiResponse<Changed>>, ApiError> {
    let changed = state
        .directory
        .assign_role(&caller, req.user_id, role_id)
        .await?;
    Ok(Json(ApiResponse::ok(Changed { changed })))
}

/// POST /api/groups
pub async fn create_group(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Group>>), ApiError> {
    let group = state.directory.create_group(&caller, &req.name).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(group))))
}

/// GET /api/groups/{group_id}/members
pub async fn list_members(
    State(state): State<AppState>,
    caller: Caller,
    Path(group_id): Path<GroupId>,
) -> Result<Json<ApiResponse<Vec<GroupMembership>>>, ApiError> {
    let members = state.directory.list_members(&caller, group_id).await?;
    Ok(Json(ApiResponse::ok(members)))
}

/// PUT /api/groups/{group_id}/members/{user_id}
pub async fn add_member(
    State(state): State<AppState>,
    caller: Caller,
    Path((group_id, user_id)): Path<(GroupId, UserId)>,
    Json(req): Json<MembershipRequest>,
) -> Result<Json<ApiResponse<GroupMembership>>, ApiError> {
    let membership = state
        .directory
        .add_member(&caller, group_id, user_id, req.is_group_admin)
        .await?;
    Ok(Json(ApiResponse::ok(membership)))
}

/// DELETE /api/groups/{group_id}/members/{user_id}
pub async fn remove_member(
    State(state): State<AppState>,
    caller: Caller,
    Path((group_id, user_id)): Path<(GroupId, UserId)>,
) -> Result<Json<ApiResponse<Changed>>, ApiError> {
    state
        .directory
        .remove_member(&caller, group_id, user_id)
        .await?;
    Ok(Json(ApiResponse::ok(Changed { changed: true })))
}
