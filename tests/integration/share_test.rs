//! Integration tests for share link issuance and token-scoped access.

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use docvault_core::types::UserId;

use crate::helpers::TestApp;

async fn issue(app: &TestApp, user: UserId, resource: Uuid, body: serde_json::Value) -> String {
    let response = app
        .request(
            "POST",
            &format!("/api/resources/{resource}/shares"),
            Some(body),
            Some(user),
        )
        .await;
    assert_eq!(
        response.status,
        StatusCode::CREATED,
        "Share failed: {:?}",
        response.body
    );
    assert!(response.data().get("password_hash").is_none());
    response.data()["token"]
        .as_str()
        .expect("No token in response")
        .to_string()
}

#[tokio::test]
async fn test_viewer_link_browses_subtree() {
    let app = TestApp::new().await;
    let owner = app.new_user();
    let docs = app.create_folder(owner, "/", "docs").await;
    let nested = app.create_folder(owner, "/docs", "2024").await;
    let other = app.create_folder(owner, "/", "private").await;

    let token = issue(&app, owner, docs, json!({ "permission_level": "viewer" })).await;

    let info = app
        .request("GET", &format!("/api/shares/{token}"), None, None)
        .await;
    assert_eq!(info.status, StatusCode::OK, "{:?}", info.body);
    assert_eq!(info.data()["level"], "viewer");
    assert_eq!(info.data()["resource"]["id"], docs.to_string());

    let inside = app
        .request(
            "GET",
            &format!("/api/shares/{token}/resources/{nested}"),
            None,
            None,
        )
        .await;
    assert_eq!(inside.status, StatusCode::OK, "{:?}", inside.body);

    let outside = app
        .request(
            "GET",
            &format!("/api/shares/{token}/resources/{other}"),
            None,
            None,
        )
        .await;
    assert_eq!(outside.status, StatusCode::NOT_FOUND);

    let upload = app
        .request(
            "POST",
            &format!("/api/shares/{token}/resources/{docs}/files"),
            Some(json!({ "name": "intruder.txt" })),
            None,
        )
        .await;
    assert_eq!(upload.status, StatusCode::FORBIDDEN);
    assert_eq!(upload.body["error"], "Unauthorized");
}

#[tokio::test]
async fn test_editor_link_can_upload() {
    let app = TestApp::new().await;
    let owner = app.new_user();
    let inbox = app.create_folder(owner, "/", "inbox").await;
    let token = issue(&app, owner, inbox, json!({ "permission_level": "editor" })).await;

    let upload = app
        .request(
            "POST",
            &format!("/api/shares/{token}/resources/{inbox}/files"),
            Some(json!({ "name": "homework.pdf", "size_bytes": 2048 })),
            None,
        )
        .await;
    assert_eq!(upload.status, StatusCode::CREATED, "{:?}", upload.body);
    assert_eq!(upload.data()["path"], "/inbox/homework.pdf");
    assert_eq!(upload.data()["owner_id"], owner.to_string());

    // Deleting through a link needs an owner-level link.
    let deleted = app
        .request(
            "DELETE",
            &format!("/api/shares/{token}/resources/{inbox}"),
            None,
            None,
        )
        .await;
    assert_eq!(deleted.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_password_protected_link() {
    let app = TestApp::new().await;
    let owner = app.new_user();
    let docs = app.create_folder(owner, "/", "docs").await;
    let token = issue(
        &app,
        owner,
        docs,
        json!({ "permission_level": "viewer", "password": "s3cret" }),
    )
    .await;

    let path = format!("/api/shares/{token}");
    let missing = app.send("GET", &path, None, None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.code(), "INVALID_PASSWORD");

    let wrong = app.send("GET", &path, None, None, Some("guess")).await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let right = app.send("GET", &path, None, None, Some("s3cret")).await;
    assert_eq!(right.status, StatusCode::OK, "{:?}", right.body);
}

#[tokio::test]
async fn test_share_rules() {
    let app = TestApp::new().await;
    let owner = app.new_user();
    let viewer = app.new_user();
    let docs = app.create_folder(owner, "/", "docs").await;

    let past = app
        .request(
            "POST",
            &format!("/api/resources/{docs}/shares"),
            Some(json!({
                "permission_level": "viewer",
                "expires_at": Utc::now() - Duration::hours(1),
            })),
            Some(owner),
        )
        .await;
    assert_eq!(past.status, StatusCode::BAD_REQUEST);

    let grant = app
        .request(
            "PUT",
            &format!("/api/resources/{docs}/grants"),
            Some(json!({
                "subject": { "kind": "user", "id": viewer },
                "permission_level": "viewer",
            })),
            Some(owner),
        )
        .await;
    assert_eq!(grant.status, StatusCode::OK, "{:?}", grant.body);

    // Viewing without the share flag does not allow sharing.
    let denied = app
        .request(
            "POST",
            &format!("/api/resources/{docs}/shares"),
            Some(json!({ "permission_level": "viewer" })),
            Some(viewer),
        )
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let unknown = app
        .request("GET", "/api/shares/not-a-real-token", None, None)
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_revoke_share() {
    let app = TestApp::new().await;
    let owner = app.new_user();
    let stranger = app.new_user();
    let docs = app.create_folder(owner, "/", "docs").await;
    let token = issue(&app, owner, docs, json!({ "permission_level": "viewer" })).await;

    let path = format!("/api/shares/{token}");
    let foreign = app.request("DELETE", &path, None, Some(stranger)).await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);

    let revoked = app.request("DELETE", &path, None, Some(owner)).await;
    assert_eq!(revoked.status, StatusCode::OK, "{:?}", revoked.body);

    let after = app.request("GET", &path, None, None).await;
    assert_eq!(after.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_shares_on_resource() {
    let app = TestApp::new().await;
    let owner = app.new_user();
    let stranger = app.new_user();
    let docs = app.create_folder(owner, "/", "docs").await;
    let token = issue(&app, owner, docs, json!({ "permission_level": "viewer" })).await;

    let path = format!("/api/resources/{docs}/shares");
    let listed = app.request("GET", &path, None, Some(owner)).await;
    assert_eq!(listed.status, StatusCode::OK, "{:?}", listed.body);
    assert_eq!(listed.data()[0]["token"], token);
    assert!(listed.data()[0].get("password_hash").is_none());

    let foreign = app.request("GET", &path, None, Some(stranger)).await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);
}
