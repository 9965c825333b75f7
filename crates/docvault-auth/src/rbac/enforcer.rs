//! Capability enforcement for resource-independent actions.

use tracing::debug;

use docvault_core::error::AppError;
use docvault_entity::directory::Capability;

use crate::principal::Principal;

/// Checks role capabilities. Never consulted for per-resource levels.
#[derive(Debug, Clone, Default)]
pub struct CapabilityEnforcer;

impl CapabilityEnforcer {
    /// Creates a new enforcer.
    pub fn new() -> Self {
        Self
    }

    /// Whether the principal holds the capability.
    pub fn has(&self, principal: &Principal, capability: Capability) -> bool {
        principal.has_capability(capability)
    }

    /// Require a capability, failing with `Authorization`.
    pub fn require(&self, principal: &Principal, capability: Capability) -> Result<(), AppError> {
        if self.has(principal, capability) {
            Ok(())
        } else {
            debug!(user_id = %principal.user_id, %capability, "Capability check failed");
            Err(AppError::authorization(format!(
                "Missing capability '{capability}'"
            )))
        }
    }
}
