//! Request DTOs.

use serde::{Deserialize, Serialize};

use docvault_core::types::UserId;

/// Query selecting a path inside an owner's scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathQuery {
    /// Raw virtual path; the root when absent.
    #[serde(default = "root_path")]
    pub path: String,
}

fn root_path() -> String {
    "/".to_string()
}

/// Create a folder named `name` in `path`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolderRequest {
    /// Parent path.
    #[serde(default = "root_path")]
    pub path: String,
    /// New folder name.
    pub name: String,
}

/// Store a file in `path`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFileRequest {
    /// Parent path.
    #[serde(default = "root_path")]
    pub path: String,
    /// Requested file name.
    pub name: String,
    /// MIME type.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Size in bytes.
    #[serde(default)]
    pub size_bytes: Option<i64>,
}

/// A bare name: the new name on rename, the folder name on create by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameRequest {
    /// The name.
    pub name: String,
}

/// Create a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    /// Unique group name.
    pub name: String,
}

/// Add or update a group member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipRequest {
    /// Whether the member may manage the group.
    #[serde(default)]
    pub is_group_admin: bool,
}

/// Assign a role to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignRoleRequest {
    /// The user receiving the role.
    pub user_id: UserId,
}
