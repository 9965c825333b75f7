//! Effective permission resolution with folder inheritance.

pub mod resolver;

pub use resolver::{EffectivePermission, PermissionResolver, PermissionSource};
