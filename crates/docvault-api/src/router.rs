//! Route definitions for the DocVault HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.

use axum::Router;
use axum::routing::{get, post, put};

use crate::handlers;
use crate::state::AppState;

/// Build the Axum router with every route, threading `state` through.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(health_routes())
        .merge(fs_routes())
        .merge(resource_routes())
        .merge(share_routes())
        .merge(grant_routes())
        .merge(role_routes())
        .merge(group_routes());

    Router::new().nest("/api", api_routes).with_state(state)
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// Browse and create by `(owner, path)`
fn fs_routes() -> Router<AppState> {
    Router::new()
        .route("/fs/{owner_id}", get(handlers::resource::browse_path))
        .route(
            "/fs/{owner_id}/folders",
            post(handlers::resource::create_folder_at_path),
        )
        .route(
            "/fs/{owner_id}/files",
            post(handlers::resource::upload_file_at_path),
        )
}

/// Resource operations by id
fn resource_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/resources/{id}",
            get(handlers::resource::get_resource)
                .patch(handlers::resource::rename_resource)
                .delete(handlers::resource::delete_resource),
        )
        .route(
            "/resources/{id}/folders",
            post(handlers::resource::create_folder),
        )
        .route("/resources/{id}/files", post(handlers::resource::upload_file))
        .route(
            "/resources/{id}/shares",
            get(handlers::share::list_shares).post(handlers::share::issue_share),
        )
}

/// Share links and token-scoped access
fn share_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/shares/{token}",
            get(handlers::share::share_info).delete(handlers::share::revoke_share),
        )
        .route(
            "/shares/{token}/resources/{id}",
            get(handlers::share::browse_shared)
                .patch(handlers::share::rename_shared)
                .delete(handlers::share::delete_shared),
        )
        .route(
            "/shares/{token}/resources/{id}/folders",
            post(handlers::share::create_shared_folder),
        )
        .route(
            "/shares/{token}/resources/{id}/files",
            post(handlers::share::upload_shared_file),
        )
}

/// Grant management
fn grant_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/resources/{id}/grants",
            get(handlers::grant::list_grants).put(handlers::grant::put_grant),
        )
        .route(
            "/resources/{id}/grants/{kind}/{subject_id}",
            axum::routing::delete(handlers::grant::revoke_grant),
        )
}

/// Roles and capabilities
fn role_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/roles",
            get(handlers::directory::list_roles).post(handlers::directory::create_role),
        )
        .route("/roles/me", get(handlers::directory::my_roles))
        .route(
            "/roles/{role_id}/assignments",
            post(handlers::directory::assign_role),
        )
}

/// Groups and membership
fn group_routes() -> Router<AppState> {
    Router::new()
        .route("/groups", post(handlers::directory::create_group))
        .route(
            "/groups/{group_id}/members",
            get(handlers::directory::list_members),
        )
        .route(
            "/groups/{group_id}/members/{user_id}",
            put(handlers::directory::add_member).delete(handlers::directory::remove_member),
        )
}
