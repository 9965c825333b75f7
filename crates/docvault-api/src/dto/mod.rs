//! Request and response bodies.

pub mod request;
pub mod response;

pub use response::ApiResponse;
