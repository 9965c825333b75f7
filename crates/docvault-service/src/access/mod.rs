//! The access control facade and its request and decision types.

pub mod action;
pub mod decision;
pub mod facade;

pub use action::Action;
pub use decision::{Credential, Decision, DenyReason, ResourceRef};
pub use facade::{AccessControlFacade, Browse, GrantRequest, NewFile, ShareRequest};
