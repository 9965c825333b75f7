//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use docvault_api::{AppState, build_app};
use docvault_core::config::AppConfig;
use docvault_core::types::UserId;
use docvault_database::{DirectoryRepository, MemoryStore};
use docvault_entity::directory::{DefaultRole, RoleAssignment};
use docvault_service::DirectoryService;

/// Test application context
pub struct TestApp {
    /// The Axum app for making test requests
    pub router: Router,
    /// Backing store for direct setup
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    /// Create a new test application over a fresh in-memory store
    pub async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    /// Create a test application with a custom configuration
    pub async fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        DirectoryService::new(store.clone())
            .seed_default_roles()
            .await
            .expect("Failed to seed roles");

        let router = build_app(AppState::new(config, store.clone()));
        Self { router, store }
    }

    /// A fresh user id with no roles
    pub fn new_user(&self) -> UserId {
        UserId::new()
    }

    /// A fresh user holding one of the default roles
    pub async fn new_user_with_role(&self, role: DefaultRole) -> UserId {
        let user_id = UserId::new();
        let role = self
            .store
            .find_role_by_name(role.name())
            .await
            .expect("Failed to look up role")
            .expect("Default role missing");
        self.store
            .assign_role(RoleAssignment {
                user_id,
                role_id: role.id,
            })
            .await
            .expect("Failed to assign role");
        user_id
    }

    /// Make an HTTP request as `user`
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        user: Option<UserId>,
    ) -> TestResponse {
        self.send(method, path, body, user, None).await
    }

    /// Make an HTTP request with an optional share password header
    pub async fn send(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        user: Option<UserId>,
        share_password: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(user) = user {
            req = req.header("x-user-id", user.to_string());
        }
        if let Some(password) = share_password {
            req = req.header("x-share-password", password);
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Create a folder at `path` in `owner`'s scope and return its id
    pub async fn create_folder(&self, owner: UserId, path: &str, name: &str) -> Uuid {
        let response = self
            .request(
                "POST",
                &format!("/api/fs/{owner}/folders"),
                Some(serde_json::json!({ "path": path, "name": name })),
                Some(owner),
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Create folder failed: {:?}",
            response.body
        );
        response.id()
    }

    /// Store a file at `path` in `owner`'s scope and return the created body
    pub async fn upload(&self, owner: UserId, path: &str, name: &str) -> TestResponse {
        self.request(
            "POST",
            &format!("/api/fs/{owner}/files"),
            Some(serde_json::json!({
                "path": path,
                "name": name,
                "mime_type": "application/pdf",
                "size_bytes": 1024,
            })),
            Some(owner),
        )
        .await
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// The `data` payload of a success envelope
    pub fn data(&self) -> &Value {
        self.body.get("data").expect("No data in response")
    }

    /// The `data.id` of a created resource
    pub fn id(&self) -> Uuid {
        self.data()["id"]
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .expect("No id in response")
    }

    /// The machine-readable error code
    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }
}
