//! Resource (file and folder) domain entities.

pub mod model;
pub mod tree;

pub use model::{CreateResource, ROOT_PATH, Resource, ResourceType, join_path};
pub use tree::ResourceTree;
