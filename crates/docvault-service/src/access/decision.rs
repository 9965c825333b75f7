//! Authorization inputs and outcomes.

use serde::{Deserialize, Serialize};

use docvault_auth::Principal;
use docvault_core::error::AppError;
use docvault_core::types::{ResourceId, UserId};
use docvault_entity::permission::PermissionLevel;

/// Who is asking.
#[derive(Debug, Clone)]
pub enum Credential {
    /// An authenticated user.
    Principal(Principal),
    /// An otherwise anonymous holder of a share token.
    ShareToken {
        /// The opaque token.
        token: String,
        /// The link password, if one was supplied.
        password: Option<String>,
    },
}

impl Credential {
    /// A share token credential.
    pub fn share_token(token: impl Into<String>, password: Option<String>) -> Self {
        Self::ShareToken {
            token: token.into(),
            password,
        }
    }
}

impl From<Principal> for Credential {
    fn from(principal: Principal) -> Self {
        Self::Principal(principal)
    }
}

/// What the request targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum ResourceRef {
    /// A resource by id.
    Id {
        /// The resource.
        id: ResourceId,
    },
    /// A virtual path inside an owner's scope.
    Path {
        /// The scope.
        owner_id: UserId,
        /// The raw path.
        path: String,
    },
}

impl ResourceRef {
    /// Target a resource by id.
    pub fn id(id: ResourceId) -> Self {
        Self::Id { id }
    }

    /// Target a path in an owner's scope.
    pub fn path(owner_id: UserId, path: impl Into<String>) -> Self {
        Self::Path {
            owner_id,
            path: path.into(),
        }
    }
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The target does not exist or is invisible to the caller.
    NotFound,
    /// The target is visible but the level is too low.
    InsufficientPermission,
    /// The share token has expired.
    Expired,
    /// The share token password was missing or wrong.
    InvalidPassword,
}

impl DenyReason {
    /// The error a denied operation surfaces. `what` names the target kind,
    /// e.g. `"Folder"`.
    pub fn into_error(self, what: &str) -> AppError {
        match self {
            Self::NotFound => AppError::not_found(format!("{what} not found")),
            Self::InsufficientPermission => AppError::authorization("Unauthorized"),
            Self::Expired => AppError::expired("Share link has expired"),
            Self::InvalidPassword => AppError::invalid_password("Invalid share password"),
        }
    }
}

/// The outcome of [`super::AccessControlFacade::authorize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// Allowed on an existing resource.
    Allow {
        /// The resolved resource. For a create by path, the deepest existing
        /// folder on the path.
        resource_id: ResourceId,
        /// The caller's effective level there.
        level: PermissionLevel,
    },
    /// Create allowed in a scope whose root does not exist yet.
    AllowNewScope {
        /// The scope's owner.
        owner_id: UserId,
    },
    /// Denied.
    Deny {
        /// Why.
        reason: DenyReason,
    },
}

impl Decision {
    /// Deny with `reason`.
    pub fn deny(reason: DenyReason) -> Self {
        Self::Deny { reason }
    }

    /// Whether the decision allows the request.
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::Deny { .. })
    }
}
