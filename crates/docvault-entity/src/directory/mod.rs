//! Groups, roles, and role capabilities.

pub mod group;
pub mod role;

pub use group::{Group, GroupMembership};
pub use role::{Capability, DefaultRole, Role, RoleAssignment, RolePermission};
