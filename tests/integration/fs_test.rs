//! Integration tests for path-addressed browsing and resource operations.

use axum::http::StatusCode;
use serde_json::json;

use docvault_entity::directory::DefaultRole;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let response = app.request("GET", "/api/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["store"], "ok");
}

#[tokio::test]
async fn test_missing_identity_is_rejected() {
    let app = TestApp::new().await;
    let owner = app.new_user();
    let response = app
        .request("GET", &format!("/api/fs/{owner}"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.code(), "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_owner_creates_scope_and_browses() {
    let app = TestApp::new().await;
    let owner = app.new_user();

    let docs = app.create_folder(owner, "/", "docs").await;
    let upload = app.upload(owner, "/docs/2024", "report.pdf").await;
    assert_eq!(upload.status, StatusCode::CREATED, "{:?}", upload.body);
    assert_eq!(upload.data()["path"], "/docs/2024/report.pdf");

    let response = app
        .request(
            "GET",
            &format!("/api/fs/{owner}?path=/docs"),
            None,
            Some(owner),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.data()["level"], "owner");
    assert_eq!(response.data()["resource"]["id"], docs.to_string());
    let subfolders = response.data()["subfolders"]
        .as_array()
        .expect("subfolders");
    assert_eq!(subfolders.len(), 1);
    assert_eq!(subfolders[0]["name"], "2024");
}

#[tokio::test]
async fn test_foreign_scope_is_hidden() {
    let app = TestApp::new().await;
    let owner = app.new_user();
    let stranger = app.new_user();
    let docs = app.create_folder(owner, "/", "docs").await;

    let by_path = app
        .request(
            "GET",
            &format!("/api/fs/{owner}?path=/docs"),
            None,
            Some(stranger),
        )
        .await;
    assert_eq!(by_path.status, StatusCode::NOT_FOUND);

    let by_id = app
        .request("GET", &format!("/api/resources/{docs}"), None, Some(stranger))
        .await;
    assert_eq!(by_id.status, StatusCode::NOT_FOUND);

    let missing = app
        .request(
            "GET",
            &format!("/api/fs/{owner}?path=/nothing-here"),
            None,
            Some(stranger),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(by_path.body["error"], missing.body["error"]);
}

#[tokio::test]
async fn test_stranger_cannot_start_someone_elses_scope() {
    let app = TestApp::new().await;
    let owner = app.new_user();
    let stranger = app.new_user();

    let response = app
        .request(
            "POST",
            &format!("/api/fs/{owner}/folders"),
            Some(json!({ "path": "/", "name": "docs" })),
            Some(stranger),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_content_manager_may_create_anywhere() {
    let app = TestApp::new().await;
    let owner = app.new_user();
    let admin = app.new_user_with_role(DefaultRole::Admin).await;
    let docs = app.create_folder(owner, "/", "docs").await;

    let created = app
        .request(
            "POST",
            &format!("/api/resources/{docs}/folders"),
            Some(json!({ "name": "from-admin" })),
            Some(admin),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
    assert_eq!(created.data()["path"], "/docs/from-admin");

    let new_scope = app
        .request(
            "POST",
            &format!("/api/fs/{}/folders", app.new_user()),
            Some(json!({ "path": "/", "name": "inbox" })),
            Some(admin),
        )
        .await;
    assert_eq!(new_scope.status, StatusCode::CREATED, "{:?}", new_scope.body);

    // Creating does not confer read access.
    let browse = app
        .request("GET", &format!("/api/resources/{docs}"), None, Some(admin))
        .await;
    assert_eq!(browse.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_name_conflicts_get_suffixes() {
    let app = TestApp::new().await;
    let owner = app.new_user();

    let mut paths = Vec::new();
    for _ in 0..3 {
        let response = app.upload(owner, "/docs", "report.pdf").await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        paths.push(response.data()["path"].as_str().unwrap_or_default().to_string());
    }
    assert_eq!(
        paths,
        vec![
            "/docs/report.pdf",
            "/docs/report (1).pdf",
            "/docs/report (2).pdf"
        ]
    );
}

#[tokio::test]
async fn test_invalid_paths_are_rejected() {
    let app = TestApp::new().await;
    let owner = app.new_user();
    app.create_folder(owner, "/", "docs").await;

    let traversal = app
        .request(
            "GET",
            &format!("/api/fs/{owner}?path=/docs/../etc"),
            None,
            Some(owner),
        )
        .await;
    assert_eq!(traversal.status, StatusCode::BAD_REQUEST);
    assert_eq!(traversal.code(), "INVALID_PATH");

    let bad_name = app
        .request(
            "POST",
            &format!("/api/fs/{owner}/folders"),
            Some(json!({ "path": "/docs", "name": "a/b" })),
            Some(owner),
        )
        .await;
    assert_eq!(bad_name.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rename_and_delete() {
    let app = TestApp::new().await;
    let owner = app.new_user();
    let docs = app.create_folder(owner, "/", "docs").await;
    app.upload(owner, "/docs", "a.txt").await;

    let renamed = app
        .request(
            "PATCH",
            &format!("/api/resources/{docs}"),
            Some(json!({ "name": "papers" })),
            Some(owner),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK, "{:?}", renamed.body);
    assert_eq!(renamed.data()["path"], "/papers");

    let moved = app
        .request(
            "GET",
            &format!("/api/fs/{owner}?path=/papers"),
            None,
            Some(owner),
        )
        .await;
    assert_eq!(moved.status, StatusCode::OK);
    assert_eq!(moved.data()["files"][0]["path"], "/papers/a.txt");

    let deleted = app
        .request("DELETE", &format!("/api/resources/{docs}"), None, Some(owner))
        .await;
    assert_eq!(deleted.status, StatusCode::OK, "{:?}", deleted.body);
    assert_eq!(deleted.data()["resources"], 2);

    let gone = app
        .request("GET", &format!("/api/resources/{docs}"), None, Some(owner))
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}
