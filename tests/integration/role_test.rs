//! Integration tests for roles, capabilities, and group administration.

use axum::http::StatusCode;
use serde_json::json;

use docvault_core::config::AppConfig;
use docvault_entity::directory::DefaultRole;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_default_roles_are_seeded() {
    let app = TestApp::new().await;
    let admin = app.new_user_with_role(DefaultRole::Admin).await;

    let roles = app.request("GET", "/api/roles", None, Some(admin)).await;
    assert_eq!(roles.status, StatusCode::OK, "{:?}", roles.body);
    let names: Vec<&str> = roles
        .data()
        .as_array()
        .expect("roles")
        .iter()
        .filter_map(|r| r["name"].as_str())
        .collect();
    for role in [DefaultRole::Admin, DefaultRole::Teacher, DefaultRole::Student] {
        assert!(names.contains(&role.name()), "missing {}", role.name());
    }

    let plain = app.new_user();
    let denied = app.request("GET", "/api/roles", None, Some(plain)).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_and_assign_role() {
    let app = TestApp::new().await;
    let admin = app.new_user_with_role(DefaultRole::Admin).await;
    let assistant = app.new_user();

    let created = app
        .request(
            "POST",
            "/api/roles",
            Some(json!({
                "name": "assistant",
                "description": "Helps with uploads",
                "capabilities": ["teacher:upload_content"],
            })),
            Some(admin),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
    let role_id = created.id();

    let duplicate = app
        .request(
            "POST",
            "/api/roles",
            Some(json!({ "name": "assistant" })),
            Some(admin),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let assigned = app
        .request(
            "POST",
            &format!("/api/roles/{role_id}/assignments"),
            Some(json!({ "user_id": assistant })),
            Some(admin),
        )
        .await;
    assert_eq!(assigned.status, StatusCode::OK, "{:?}", assigned.body);
    assert_eq!(assigned.data()["changed"], true);

    let mine = app
        .request("GET", "/api/roles/me", None, Some(assistant))
        .await;
    assert_eq!(mine.status, StatusCode::OK);
    assert_eq!(mine.data()[0]["name"], "assistant");

    let not_admin = app
        .request(
            "POST",
            &format!("/api/roles/{role_id}/assignments"),
            Some(json!({ "user_id": app.new_user() })),
            Some(assistant),
        )
        .await;
    assert_eq!(not_admin.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_upload_capability_gate() {
    let mut config = AppConfig::default();
    config.access.require_upload_capability = true;
    let app = TestApp::with_config(config).await;

    let student = app.new_user_with_role(DefaultRole::Student).await;
    let denied = app
        .request(
            "POST",
            &format!("/api/fs/{student}/folders"),
            Some(json!({ "path": "/", "name": "notes" })),
            Some(student),
        )
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let teacher = app.new_user_with_role(DefaultRole::Teacher).await;
    let course = app.create_folder(teacher, "/", "course").await;
    let nested = app
        .request(
            "POST",
            &format!("/api/resources/{course}/folders"),
            Some(json!({ "name": "week1" })),
            Some(teacher),
        )
        .await;
    assert_eq!(nested.status, StatusCode::CREATED, "{:?}", nested.body);
}

#[tokio::test]
async fn test_group_membership_administration() {
    let app = TestApp::new().await;
    let creator = app.new_user();
    let member = app.new_user();
    let outsider = app.new_user();

    let group = app
        .request(
            "POST",
            "/api/groups",
            Some(json!({ "name": "study-group" })),
            Some(creator),
        )
        .await;
    assert_eq!(group.status, StatusCode::CREATED, "{:?}", group.body);
    let group_id = group.id();
    let members_path = format!("/api/groups/{group_id}/members");

    let added = app
        .request(
            "PUT",
            &format!("{members_path}/{member}"),
            Some(json!({ "is_group_admin": false })),
            Some(creator),
        )
        .await;
    assert_eq!(added.status, StatusCode::OK, "{:?}", added.body);

    let by_member = app
        .request(
            "PUT",
            &format!("{members_path}/{outsider}"),
            Some(json!({})),
            Some(member),
        )
        .await;
    assert_eq!(by_member.status, StatusCode::FORBIDDEN);

    let listed = app.request("GET", &members_path, None, Some(member)).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.data().as_array().map(Vec::len), Some(2));

    let hidden = app.request("GET", &members_path, None, Some(outsider)).await;
    assert_eq!(hidden.status, StatusCode::NOT_FOUND);

    let removed = app
        .request("DELETE", &format!("{members_path}/{member}"), None, Some(creator))
        .await;
    assert_eq!(removed.status, StatusCode::OK, "{:?}", removed.body);

    let again = app
        .request("DELETE", &format!("{members_path}/{member}"), None, Some(creator))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}
