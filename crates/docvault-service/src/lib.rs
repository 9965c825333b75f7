//! # docvault-service
//!
//! Use cases of the DocVault engine. Each service is constructed with its
//! store and configuration section; there is no process-wide state.
//!
//! Route handlers call [`AccessControlFacade`] for every resource operation
//! and [`DirectoryService`] for group and role administration.

pub mod access;
pub mod directory;
pub mod grant;
pub mod path;
pub mod share;

pub use access::{
    AccessControlFacade, Action, Browse, Credential, Decision, DenyReason, GrantRequest, NewFile,
    ResourceRef, ShareRequest,
};
pub use directory::{CreateRole, DirectoryService};
pub use grant::GrantService;
pub use path::{Listing, PathResolver, VirtualPath};
pub use share::{IssueShare, ShareTokenService, TokenGenerator};
