//! Group entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use docvault_core::types::{GroupId, UserId};

/// A named set of users. Membership is the unit of group-derived permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Group {
    /// Unique group identifier.
    pub id: GroupId,
    /// Unique group name.
    pub name: String,
    /// When the group was created.
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// Build a new group with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: GroupId::new(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// A user's membership in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct GroupMembership {
    /// The group.
    pub group_id: GroupId,
    /// The member.
    pub user_id: UserId,
    /// Whether the member may manage the group's membership.
    pub is_group_admin: bool,
}
