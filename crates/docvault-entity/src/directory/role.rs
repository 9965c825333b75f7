//! Role entity model and coarse role capabilities.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use docvault_core::types::{RoleId, UserId};

/// A coarse, resource-independent capability granted through roles.
///
/// Capabilities authorize actions that are not tied to one resource (creating
/// top-level content, administering roles). They never raise a principal's
/// level on a specific resource.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "capability")]
pub enum Capability {
    /// Administer users and group membership.
    #[sqlx(rename = "admin:manage_users")]
    #[serde(rename = "admin:manage_users")]
    ManageUsers,
    /// Create roles and list all roles.
    #[sqlx(rename = "admin:manage_roles")]
    #[serde(rename = "admin:manage_roles")]
    ManageRoles,
    /// Assign roles to users.
    #[sqlx(rename = "admin:assign_roles")]
    #[serde(rename = "admin:assign_roles")]
    AssignRoles,
    /// Create content in any owner's scope.
    #[sqlx(rename = "admin:manage_content")]
    #[serde(rename = "admin:manage_content")]
    ManageContent,
    /// Upload top-level content.
    #[sqlx(rename = "teacher:upload_content")]
    #[serde(rename = "teacher:upload_content")]
    UploadContent,
    /// Edit content.
    #[sqlx(rename = "teacher:edit_content")]
    #[serde(rename = "teacher:edit_content")]
    EditContent,
    /// Delete content with Editor-level access.
    #[sqlx(rename = "teacher:delete_content")]
    #[serde(rename = "teacher:delete_content")]
    DeleteContent,
    /// View content.
    #[sqlx(rename = "student:view_content")]
    #[serde(rename = "student:view_content")]
    ViewContent,
}

impl Capability {
    /// All capabilities.
    pub const ALL: [Capability; 8] = [
        Self::ManageUsers,
        Self::ManageRoles,
        Self::AssignRoles,
        Self::ManageContent,
        Self::UploadContent,
        Self::EditContent,
        Self::DeleteContent,
        Self::ViewContent,
    ];

    /// Return the stored label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManageUsers => "admin:manage_users",
            Self::ManageRoles => "admin:manage_roles",
            Self::AssignRoles => "admin:assign_roles",
            Self::ManageContent => "admin:manage_content",
            Self::UploadContent => "teacher:upload_content",
            Self::EditContent => "teacher:edit_content",
            Self::DeleteContent => "teacher:delete_content",
            Self::ViewContent => "student:view_content",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Capability {
    type Err = docvault_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        // Teachers historically carried their own view label.
        if lowered == "teacher:view_content" {
            return Ok(Self::ViewContent);
        }
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == lowered)
            .ok_or_else(|| {
                docvault_core::AppError::validation(format!("Invalid capability: '{s}'"))
            })
    }
}

/// A named role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Role {
    /// Unique role identifier.
    pub id: RoleId,
    /// Unique role name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// When the role was created.
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Build a new role with a fresh id.
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: RoleId::new(),
            name: name.into(),
            description,
            created_at: Utc::now(),
        }
    }
}

/// A user holding a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct RoleAssignment {
    /// The holder.
    pub user_id: UserId,
    /// The role.
    pub role_id: RoleId,
}

/// A capability attached to a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct RolePermission {
    /// The role.
    pub role_id: RoleId,
    /// The granted capability.
    pub capability: Capability,
}

/// Roles seeded into every fresh store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultRole {
    /// System administrator.
    Admin,
    /// Content author.
    Teacher,
    /// Content consumer.
    Student,
}

impl DefaultRole {
    /// All seeded roles.
    pub const ALL: [DefaultRole; 3] = [Self::Admin, Self::Teacher, Self::Student];

    /// Role name as stored.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Student => "student",
        }
    }

    /// Seeded description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Admin => "Administrator with full system access",
            Self::Teacher => "Can upload, edit and delete content",
            Self::Student => "Can view content",
        }
    }

    /// Capabilities the role is seeded with.
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Self::Admin => &[
                Capability::ManageUsers,
                Capability::ManageRoles,
                Capability::AssignRoles,
                Capability::ManageContent,
            ],
            Self::Teacher => &[
                Capability::UploadContent,
                Capability::EditContent,
                Capability::DeleteContent,
                Capability::ViewContent,
            ],
            Self::Student => &[Capability::ViewContent],
        }
    }
}
