//! # docvault-auth
//!
//! Authorization building blocks for DocVault.
//!
//! ## Modules
//!
//! - `principal` — the authenticated user with its groups, roles, and capabilities
//! - `acl` — effective permission resolution over the ancestor chain
//! - `rbac` — coarse, resource-independent role capability checks
//! - `password` — Argon2id hashing for share link passwords

pub mod acl;
pub mod password;
pub mod principal;
pub mod rbac;

pub use acl::{EffectivePermission, PermissionResolver, PermissionSource};
pub use password::PasswordHasher;
pub use principal::{Principal, PrincipalLoader};
pub use rbac::CapabilityEnforcer;
