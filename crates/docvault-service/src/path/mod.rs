//! Virtual path resolution over the materialized folder tree.

pub mod naming;
pub mod normalize;
pub mod resolver;

pub use normalize::VirtualPath;
pub use resolver::{Listing, PathResolver};
