//! Permission level enumeration.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Permission level on a resource.
///
/// Totally ordered: `None < Viewer < Commenter < Editor < Owner`. All
/// comparisons go through [`PermissionLevel::privilege_level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "permission_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    /// No access.
    #[default]
    None,
    /// Read-only access.
    Viewer,
    /// Can add comments but not modify.
    Commenter,
    /// Can create, rename, and edit content.
    Editor,
    /// Full control including deletion and grant management.
    Owner,
}

impl PermissionLevel {
    /// All levels, lowest first.
    pub const ALL: [PermissionLevel; 5] = [
        Self::None,
        Self::Viewer,
        Self::Commenter,
        Self::Editor,
        Self::Owner,
    ];

    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Viewer => 1,
            Self::Commenter => 2,
            Self::Editor => 3,
            Self::Owner => 4,
        }
    }

    /// Check if this permission grants at least the given level.
    pub fn has_at_least(&self, required: PermissionLevel) -> bool {
        *self >= required
    }

    /// Whether this level grants any access at all.
    pub fn is_none(&self) -> bool {
        *self == Self::None
    }

    /// Return the level as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Viewer => "viewer",
            Self::Commenter => "commenter",
            Self::Editor => "editor",
            Self::Owner => "owner",
        }
    }
}

impl Ord for PermissionLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.privilege_level().cmp(&other.privilege_level())
    }
}

impl PartialOrd for PermissionLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PermissionLevel {
    type Err = docvault_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "viewer" => Ok(Self::Viewer),
            "commenter" => Ok(Self::Commenter),
            "editor" => Ok(Self::Editor),
            "owner" => Ok(Self::Owner),
            _ => Err(docvault_core::AppError::validation(format!(
                "Invalid permission level: '{s}'"
            ))),
        }
    }
}
