//! Group and role administration.

pub mod service;

pub use service::{CreateRole, DirectoryService};
