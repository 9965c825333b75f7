//! Share tokens: issue, validate, revoke.

pub mod service;
pub mod token;

pub use service::{IssueShare, ShareTokenService};
pub use token::TokenGenerator;
