//! Role capability enforcement.

pub mod enforcer;

pub use enforcer::CapabilityEnforcer;
