//! Shared value types.

pub mod id;

pub use id::{GrantId, GroupId, ResourceId, RoleId, UserId};
