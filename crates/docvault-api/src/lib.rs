//! # docvault-api
//!
//! HTTP boundary for DocVault built on Axum.
//!
//! Handlers identify the caller, build a credential, and hand every
//! resource operation to the access control facade. Domain errors become
//! JSON error bodies in [`error`].

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use state::AppState;
