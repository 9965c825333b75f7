//! Grant entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use docvault_core::types::{GrantId, GroupId, ResourceId, RoleId, UserId};

use super::level::PermissionLevel;

/// Kind of subject a grant names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subject_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    /// A single user.
    User,
    /// Every member of a group.
    Group,
    /// Every holder of a role.
    Role,
}

impl SubjectKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
            Self::Role => "role",
        }
    }
}

impl std::fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SubjectKind {
    type Err = docvault_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "group" => Ok(Self::Group),
            "role" => Ok(Self::Role),
            _ => Err(docvault_core::AppError::validation(format!(
                "Invalid subject kind: '{s}'"
            ))),
        }
    }
}

/// The subject a grant is attached to, with its typed identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Subject {
    /// A direct grant.
    User(UserId),
    /// A group grant.
    Group(GroupId),
    /// A role-scoped grant.
    Role(RoleId),
}

impl Subject {
    /// Build a subject from its stored `(kind, id)` pair.
    pub fn from_parts(kind: SubjectKind, id: Uuid) -> Self {
        match kind {
            SubjectKind::User => Self::User(UserId::from_uuid(id)),
            SubjectKind::Group => Self::Group(GroupId::from_uuid(id)),
            SubjectKind::Role => Self::Role(RoleId::from_uuid(id)),
        }
    }

    /// The subject kind.
    pub fn kind(&self) -> SubjectKind {
        match self {
            Self::User(_) => SubjectKind::User,
            Self::Group(_) => SubjectKind::Group,
            Self::Role(_) => SubjectKind::Role,
        }
    }

    /// The untyped subject identifier.
    pub fn id(&self) -> Uuid {
        match self {
            Self::User(id) => id.into_uuid(),
            Self::Group(id) => id.into_uuid(),
            Self::Role(id) => id.into_uuid(),
        }
    }
}

/// A permission grant attaching a level to a subject on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Grant {
    /// Unique grant identifier.
    pub id: GrantId,
    /// Kind of subject.
    pub subject_kind: SubjectKind,
    /// User, group, or role id depending on `subject_kind`.
    pub subject_id: Uuid,
    /// The resource this grant is attached to.
    pub resource_id: ResourceId,
    /// The granted level.
    pub permission_level: PermissionLevel,
    /// Whether the grant reaches descendants, and whether this resource
    /// lets inheritance pass through from its parent.
    pub inherit_from_parent: bool,
    /// Whether the subject may re-share the resource.
    pub can_share: bool,
    /// Whether this is the creation owner grant.
    pub is_owner: bool,
    /// When the grant was created.
    pub created_at: DateTime<Utc>,
}

impl Grant {
    /// Build the owner grant written together with a new resource.
    pub fn owner(resource_id: ResourceId, owner_id: UserId) -> Self {
        Self {
            id: GrantId::new(),
            subject_kind: SubjectKind::User,
            subject_id: owner_id.into_uuid(),
            resource_id,
            permission_level: PermissionLevel::Owner,
            inherit_from_parent: true,
            can_share: true,
            is_owner: true,
            created_at: Utc::now(),
        }
    }

    /// The typed subject.
    pub fn subject(&self) -> Subject {
        Subject::from_parts(self.subject_kind, self.subject_id)
    }

    /// Whether this grant names the given subject.
    pub fn is_for(&self, subject: &Subject) -> bool {
        self.subject_kind == subject.kind() && self.subject_id == subject.id()
    }

    /// Whether holders of this grant may re-share. Owners always may.
    pub fn allows_sharing(&self) -> bool {
        self.can_share || self.permission_level == PermissionLevel::Owner
    }
}

/// Data required to put a grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGrant {
    /// Who receives the grant.
    pub subject: Subject,
    /// Target resource.
    pub resource_id: ResourceId,
    /// Granted level.
    pub permission_level: PermissionLevel,
    /// Inheritance flag.
    #[serde(default = "default_true")]
    pub inherit_from_parent: bool,
    /// Re-share flag.
    #[serde(default)]
    pub can_share: bool,
}

impl NewGrant {
    /// Materialize the grant with a fresh id and timestamp.
    pub fn into_grant(self) -> Grant {
        Grant {
            id: GrantId::new(),
            subject_kind: self.subject.kind(),
            subject_id: self.subject.id(),
            resource_id: self.resource_id,
            permission_level: self.permission_level,
            inherit_from_parent: self.inherit_from_parent,
            can_share: self.can_share,
            is_owner: false,
            created_at: Utc::now(),
        }
    }
}

fn default_true() -> bool {
    true
}
