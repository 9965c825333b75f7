//! Grant management on resources.

pub mod service;

pub use service::GrantService;
