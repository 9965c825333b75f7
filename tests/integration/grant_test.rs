//! Integration tests for grant management and inherited access.

use axum::http::StatusCode;
use serde_json::json;

use uuid::Uuid;

use docvault_core::types::UserId;

use crate::helpers::TestApp;

async fn grant_viewer(app: &TestApp, owner: UserId, subject: UserId, resource: Uuid, inherit: bool) {
    let response = app
        .request(
            "PUT",
            &format!("/api/resources/{resource}/grants"),
            Some(json!({
                "subject": { "kind": "user", "id": subject },
                "permission_level": "viewer",
                "inherit_from_parent": inherit,
            })),
            Some(owner),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
}

#[tokio::test]
async fn test_viewer_grant_inherits_downward() {
    let app = TestApp::new().await;
    let owner = app.new_user();
    let reader = app.new_user();
    let course = app.create_folder(owner, "/", "course").await;
    let week1 = app.create_folder(owner, "/course", "week1").await;

    let grant = app
        .request(
            "PUT",
            &format!("/api/resources/{course}/grants"),
            Some(json!({
                "subject": { "kind": "user", "id": reader },
                "permission_level": "viewer",
            })),
            Some(owner),
        )
        .await;
    assert_eq!(grant.status, StatusCode::OK, "{:?}", grant.body);
    assert_eq!(grant.data()["permission_level"], "viewer");
    assert_eq!(grant.data()["inherit_from_parent"], true);

    let browse = app
        .request("GET", &format!("/api/resources/{week1}"), None, Some(reader))
        .await;
    assert_eq!(browse.status, StatusCode::OK, "{:?}", browse.body);
    assert_eq!(browse.data()["level"], "viewer");

    let rename = app
        .request(
            "PATCH",
            &format!("/api/resources/{week1}"),
            Some(json!({ "name": "week-one" })),
            Some(reader),
        )
        .await;
    assert_eq!(rename.status, StatusCode::FORBIDDEN);

    let grants = app
        .request(
            "GET",
            &format!("/api/resources/{course}/grants"),
            None,
            Some(reader),
        )
        .await;
    assert_eq!(grants.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_scoped_grants_only_bind_their_subject() {
    let app = TestApp::new().await;
    let owner = app.new_user();
    let reader = app.new_user();
    let outsider = app.new_user();
    let course = app.create_folder(owner, "/", "course").await;
    let week1 = app.create_folder(owner, "/course", "week1").await;

    grant_viewer(&app, owner, reader, course, true).await;
    grant_viewer(&app, owner, app.new_user(), week1, false).await;
    grant_viewer(&app, owner, outsider, course, false).await;

    let listing = app
        .request("GET", &format!("/api/resources/{course}"), None, Some(reader))
        .await;
    assert_eq!(listing.status, StatusCode::OK, "{:?}", listing.body);
    assert_eq!(listing.data()["subfolders"][0]["id"], week1.to_string());
    let inner = app
        .request("GET", &format!("/api/resources/{week1}"), None, Some(reader))
        .await;
    assert_eq!(inner.status, StatusCode::OK, "{:?}", inner.body);

    let scoped = app
        .request("GET", &format!("/api/resources/{course}"), None, Some(outsider))
        .await;
    assert_eq!(scoped.status, StatusCode::OK, "{:?}", scoped.body);
    assert_eq!(scoped.data()["subfolders"], json!([]));
    let hidden = app
        .request("GET", &format!("/api/resources/{week1}"), None, Some(outsider))
        .await;
    assert_eq!(hidden.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_group_grant_and_revoke() {
    let app = TestApp::new().await;
    let owner = app.new_user();
    let student = app.new_user();
    let course = app.create_folder(owner, "/", "course").await;

    let group = app
        .request(
            "POST",
            "/api/groups",
            Some(json!({ "name": "class-of-2026" })),
            Some(owner),
        )
        .await;
    assert_eq!(group.status, StatusCode::CREATED, "{:?}", group.body);
    let group_id = group.id();

    let member = app
        .request(
            "PUT",
            &format!("/api/groups/{group_id}/members/{student}"),
            Some(json!({})),
            Some(owner),
        )
        .await;
    assert_eq!(member.status, StatusCode::OK, "{:?}", member.body);

    let grant = app
        .request(
            "PUT",
            &format!("/api/resources/{course}/grants"),
            Some(json!({
                "subject": { "kind": "group", "id": group_id },
                "permission_level": "editor",
            })),
            Some(owner),
        )
        .await;
    assert_eq!(grant.status, StatusCode::OK, "{:?}", grant.body);

    let upload = app
        .request(
            "POST",
            &format!("/api/resources/{course}/files"),
            Some(json!({ "name": "essay.docx" })),
            Some(student),
        )
        .await;
    assert_eq!(upload.status, StatusCode::CREATED, "{:?}", upload.body);

    let revoke = app
        .request(
            "DELETE",
            &format!("/api/resources/{course}/grants/group/{group_id}"),
            None,
            Some(owner),
        )
        .await;
    assert_eq!(revoke.status, StatusCode::OK, "{:?}", revoke.body);

    let hidden = app
        .request("GET", &format!("/api/resources/{course}"), None, Some(student))
        .await;
    assert_eq!(hidden.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_owner_grant_is_protected() {
    let app = TestApp::new().await;
    let owner = app.new_user();
    let course = app.create_folder(owner, "/", "course").await;

    let grants = app
        .request(
            "GET",
            &format!("/api/resources/{course}/grants"),
            None,
            Some(owner),
        )
        .await;
    assert_eq!(grants.status, StatusCode::OK, "{:?}", grants.body);

    let bad_kind = app
        .request(
            "DELETE",
            &format!("/api/resources/{course}/grants/robot/{owner}"),
            None,
            Some(owner),
        )
        .await;
    assert_eq!(bad_kind.status, StatusCode::BAD_REQUEST);

    let missing = app
        .request(
            "DELETE",
            &format!("/api/resources/{course}/grants/user/{}", app.new_user()),
            None,
            Some(owner),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let none_level = app
        .request(
            "PUT",
            &format!("/api/resources/{course}/grants"),
            Some(json!({
                "subject": { "kind": "user", "id": app.new_user() },
                "permission_level": "none",
            })),
            Some(owner),
        )
        .await;
    assert_eq!(none_level.status, StatusCode::BAD_REQUEST);
}
