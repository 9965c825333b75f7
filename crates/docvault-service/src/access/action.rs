//! Actions a caller can request on a resource.

use std::fmt;

use serde::{Deserialize, Serialize};

use docvault_entity::permission::PermissionLevel;

/// An operation subject to authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Read a file or folder's metadata.
    Read,
    /// List a folder's children.
    List,
    /// Create content inside a folder.
    Create,
    /// Rename a resource.
    Rename,
    /// Delete a resource and its subtree.
    Delete,
    /// Issue a share token.
    Share,
    /// List, put, or revoke grants.
    ManageGrants,
}

impl Action {
    /// The minimum level the action needs.
    ///
    /// `Delete` also passes at `Editor` with the delete capability, and
    /// `Share` additionally needs the re-share flag.
    pub fn required_level(&self) -> PermissionLevel {
        match self {
            Self::Read | Self::List | Self::Share => PermissionLevel::Viewer,
            Self::Create | Self::Rename => PermissionLevel::Editor,
            Self::Delete | Self::ManageGrants => PermissionLevel::Owner,
        }
    }

    /// Whether a share token can ever authorize the action.
    pub fn token_may(&self) -> bool {
        !matches!(self, Self::Share | Self::ManageGrants)
    }

    /// Return the action as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::List => "list",
            Self::Create => "create",
            Self::Rename => "rename",
            Self::Delete => "delete",
            Self::Share => "share",
            Self::ManageGrants => "manage_grants",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_levels() {
        assert_eq!(Action::Read.required_level(), PermissionLevel::Viewer);
        assert_eq!(Action::Create.required_level(), PermissionLevel::Editor);
        assert_eq!(Action::Rename.required_level(), PermissionLevel::Editor);
        assert_eq!(Action::Delete.required_level(), PermissionLevel::Owner);
        assert_eq!(Action::ManageGrants.required_level(), PermissionLevel::Owner);
    }

    #[test]
    fn test_tokens_never_share_or_manage() {
        assert!(Action::Delete.token_may());
        assert!(!Action::Share.token_may());
        assert!(!Action::ManageGrants.token_may());
    }
}
