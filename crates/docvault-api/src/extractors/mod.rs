//! Custom Axum extractors.

pub mod caller;
pub mod share;

pub use caller::Caller;
pub use share::SharePassword;
