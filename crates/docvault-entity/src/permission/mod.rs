//! Permission levels and resource grants.

pub mod grant;
pub mod level;

pub use grant::{Grant, NewGrant, Subject, SubjectKind};
pub use level::PermissionLevel;
