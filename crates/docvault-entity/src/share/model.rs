//! Share token entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use docvault_core::types::{ResourceId, UserId};

use crate::permission::PermissionLevel;

/// A principal-independent capability on one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ShareToken {
    /// Opaque, unguessable token string.
    pub token: String,
    /// The shared resource (and its descendants for folders).
    pub resource_id: ResourceId,
    /// The exact level the token grants.
    pub permission_level: PermissionLevel,
    /// Argon2 hash of the link password.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// When the token stops validating.
    pub expires_at: Option<DateTime<Utc>>,
    /// Who issued the token.
    pub issued_by: UserId,
    /// When the token was issued.
    pub created_at: DateTime<Utc>,
    /// Last successful validation.
    pub last_used_at: Option<DateTime<Utc>>,
}

impl ShareToken {
    /// Check if the token is past its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now > exp)
    }

    /// Check if a password is required.
    pub fn is_password_protected(&self) -> bool {
        self.password_hash.is_some()
    }
}
