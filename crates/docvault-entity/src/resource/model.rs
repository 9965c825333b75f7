//! Resource (file or folder) entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use docvault_core::types::{ResourceId, UserId};

/// Canonical path of every owner's root folder.
pub const ROOT_PATH: &str = "/";

/// Whether a resource is a file or a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "resource_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// Content.
    File,
    /// Structure.
    Folder,
}

impl ResourceType {
    /// Return the type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A file or folder in an owner's virtual hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Resource {
    /// Unique resource identifier.
    pub id: ResourceId,
    /// The owner whose scope this resource lives in.
    pub owner_id: UserId,
    /// File or folder.
    pub resource_type: ResourceType,
    /// Last path segment (empty for the root).
    pub name: String,
    /// Canonical path, unique per owner (e.g. `/documents/reports`).
    pub path: String,
    /// Parent folder (None only for the owner's root).
    pub parent_id: Option<ResourceId>,
    /// MIME type for files.
    pub mime_type: Option<String>,
    /// Size in bytes for files.
    pub size_bytes: Option<i64>,
    /// When the resource was created.
    pub created_at: DateTime<Utc>,
    /// When the resource was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Check if this is the owner's root folder.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Check if this is a folder.
    pub fn is_folder(&self) -> bool {
        self.resource_type == ResourceType::Folder
    }

    /// Canonical path of a child named `name`.
    pub fn child_path(&self, name: &str) -> String {
        join_path(&self.path, name)
    }
}

/// Append a segment to a canonical folder path.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent == ROOT_PATH {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Data required to create a new resource row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResource {
    /// Owner scope.
    pub owner_id: UserId,
    /// File or folder.
    pub resource_type: ResourceType,
    /// Last path segment.
    pub name: String,
    /// Canonical path.
    pub path: String,
    /// Parent folder (None for the root).
    pub parent_id: Option<ResourceId>,
    /// MIME type.
    pub mime_type: Option<String>,
    /// Size in bytes.
    pub size_bytes: Option<i64>,
}

impl CreateResource {
    /// The root folder for an owner.
    pub fn root(owner_id: UserId) -> Self {
        Self {
            owner_id,
            resource_type: ResourceType::Folder,
            name: String::new(),
            path: ROOT_PATH.to_string(),
            parent_id: None,
            mime_type: None,
            size_bytes: None,
        }
    }

    /// A folder named `name` under `parent`.
    pub fn folder(parent: &Resource, name: &str) -> Self {
        Self {
            owner_id: parent.owner_id,
            resource_type: ResourceType::Folder,
            name: name.to_string(),
            path: parent.child_path(name),
            parent_id: Some(parent.id),
            mime_type: None,
            size_bytes: None,
        }
    }

    /// A file named `name` under `parent`.
    pub fn file(
        parent: &Resource,
        name: &str,
        mime_type: Option<String>,
        size_bytes: Option<i64>,
    ) -> Self {
        Self {
            owner_id: parent.owner_id,
            resource_type: ResourceType::File,
            name: name.to_string(),
            path: parent.child_path(name),
            parent_id: Some(parent.id),
            mime_type,
            size_bytes,
        }
    }

    /// Build the stored row with a fresh id and timestamps.
    pub fn into_resource(self) -> Resource {
        let now = Utc::now();
        Resource {
            id: ResourceId::new(),
            owner_id: self.owner_id,
            resource_type: self.resource_type,
            name: self.name,
            path: self.path,
            parent_id: self.parent_id,
            mime_type: self.mime_type,
            size_bytes: self.size_bytes,
            created_at: now,
            updated_at: now,
        }
    }
}
