//! Route handlers, one module per domain.

pub mod directory;
pub mod grant;
pub mod health;
pub mod resource;
pub mod share;
