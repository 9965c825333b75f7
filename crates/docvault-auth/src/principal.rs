//! The subject of an authorization decision.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use docvault_core::result::AppResult;
use docvault_core::types::{GroupId, RoleId, UserId};
use docvault_database::Store;
use docvault_entity::directory::Capability;
use docvault_entity::permission::{Grant, SubjectKind};

/// An authenticated user together with its group memberships, role
/// assignments, and the capabilities those roles carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// The internal user id.
    pub user_id: UserId,
    /// Groups the user belongs to.
    pub groups: Vec<GroupId>,
    /// Roles the user holds.
    pub roles: Vec<RoleId>,
    /// Union of the roles' capabilities.
    pub capabilities: BTreeSet<Capability>,
}

impl Principal {
    /// A principal with no groups and no roles.
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            groups: Vec::new(),
            roles: Vec::new(),
            capabilities: BTreeSet::new(),
        }
    }

    /// Add group memberships.
    pub fn with_groups(mut self, groups: impl IntoIterator<Item = GroupId>) -> Self {
        self.groups.extend(groups);
        self
    }

    /// Add role assignments.
    pub fn with_roles(mut self, roles: impl IntoIterator<Item = RoleId>) -> Self {
        self.roles.extend(roles);
        self
    }

    /// Add capabilities.
    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities.extend(capabilities);
        self
    }

    /// Whether any held role carries `capability`.
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Whether `grant` names this user directly.
    pub fn is_direct_subject(&self, grant: &Grant) -> bool {
        grant.subject_kind == SubjectKind::User && grant.subject_id == self.user_id.into_uuid()
    }

    /// Whether `grant` names one of this user's groups or roles.
    pub fn is_indirect_subject(&self, grant: &Grant) -> bool {
        match grant.subject_kind {
            SubjectKind::User => false,
            SubjectKind::Group => self.groups.iter().any(|g| g.into_uuid() == grant.subject_id),
            SubjectKind::Role => self.roles.iter().any(|r| r.into_uuid() == grant.subject_id),
        }
    }
}

/// Builds principals from the directory.
#[derive(Debug, Clone)]
pub struct PrincipalLoader {
    store: Arc<dyn Store>,
}

impl PrincipalLoader {
    /// Creates a new loader.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Load a user's groups, roles, and capabilities.
    pub async fn load(&self, user_id: UserId) -> AppResult<Principal> {
        let groups = self.store.groups_for_user(user_id).await?;
        let roles: Vec<RoleId> = self
            .store
            .roles_for_user(user_id)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();
        let capabilities = if roles.is_empty() {
            Vec::new()
        } else {
            self.store.capabilities_for_roles(&roles).await?
        };

        debug!(
            user_id = %user_id,
            groups = groups.len(),
            roles = roles.len(),
            "Loaded principal"
        );

        Ok(Principal::user(user_id)
            .with_groups(groups)
            .with_roles(roles)
            .with_capabilities(capabilities))
    }
}
