//! Group membership and role administration.
//!
//! Roles carry coarse capabilities checked by [`CapabilityEnforcer`]; they
//! never feed the per-resource permission walk.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use docvault_auth::{CapabilityEnforcer, Principal};
use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::{GroupId, RoleId, UserId};
use docvault_database::Store;
use docvault_entity::directory::{
    Capability, DefaultRole, Group, GroupMembership, Role, RoleAssignment,
};

/// Request to create a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    /// Unique role name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Capabilities the role carries.
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

/// Administers groups and roles.
#[derive(Debug, Clone)]
pub struct DirectoryService {
    store: Arc<dyn Store>,
    enforcer: CapabilityEnforcer,
}

impl DirectoryService {
    /// Creates a new directory service.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            enforcer: CapabilityEnforcer::new(),
        }
    }

    /// Create the built-in roles that do not exist yet. Safe to call on
    /// every start.
    pub async fn seed_default_roles(&self) -> AppResult<Vec<Role>> {
        let mut roles = Vec::with_capacity(DefaultRole::ALL.len());
        for default in DefaultRole::ALL {
            if let Some(existing) = self.store.find_role_by_name(default.name()).await? {
                roles.push(existing);
                continue;
            }
            let role = Role::new(default.name(), Some(default.description().to_string()));
            match self.store.create_role(role, default.capabilities()).await {
                Ok(role) => {
                    info!(role = %role.name, "Default role seeded");
                    roles.push(role);
                }
                Err(e) if e.is_conflict() => {
                    let existing = self
                        .store
                        .find_role_by_name(default.name())
                        .await?
                        .ok_or_else(|| AppError::internal("Seeded role vanished"))?;
                    roles.push(existing);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(roles)
    }

    /// Create a role. Requires `ManageRoles`.
    pub async fn create_role(&self, principal: &Principal, req: CreateRole) -> AppResult<Role> {
        self.enforcer.require(principal, Capability::ManageRoles)?;
        let name = req.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Role name must not be empty"));
        }

        let mut capabilities = req.capabilities;
        capabilities.sort();
        capabilities.dedup();

        let role = self
            .store
            .create_role(Role::new(name, req.description), &capabilities)
            .await?;
        info!(
            actor = %principal.user_id,
            role_id = %role.id,
            role = %role.name,
            capabilities = capabilities.len(),
            "Role created"
        );
        Ok(role)
    }

    /// Assign a role to a user. Requires `AssignRoles`. Returns `false` when
    /// the user already held the role.
    pub async fn assign_role(
        &self,
        principal: &Principal,
        user_id: UserId,
        role_id: RoleId,
    ) -> AppResult<bool> {
        self.enforcer.require(principal, Capability::AssignRoles)?;
        let added = self
            .store
            .assign_role(RoleAssignment { user_id, role_id })
            .await?;
        if added {
            info!(actor = %principal.user_id, %user_id, %role_id, "Role assigned");
        } else {
            debug!(%user_id, %role_id, "Role already assigned");
        }
        Ok(added)
    }

    /// Every role. Requires `ManageRoles`.
    pub async fn list_roles(&self, principal: &Principal) -> AppResult<Vec<Role>> {
        self.enforcer.require(principal, Capability::ManageRoles)?;
        self.store.list_roles().await
    }

    /// Roles held by the principal.
    pub async fn my_roles(&self, principal: &Principal) -> AppResult<Vec<Role>> {
        self.store.roles_for_user(principal.user_id).await
    }

    /// Create a group. The creator becomes its first group admin.
    pub async fn create_group(&self, principal: &Principal, name: &str) -> AppResult<Group> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Group name must not be empty"));
        }
        let group = self
            .store
            .create_group(Group::new(name), principal.user_id)
            .await?;
        info!(
            actor = %principal.user_id,
            group_id = %group.id,
            group = %group.name,
            "Group created"
        );
        Ok(group)
    }

    /// Add or update a member. Requires group admin or `ManageUsers`.
    pub async fn add_member(
        &self,
        principal: &Principal,
        group_id: GroupId,
        user_id: UserId,
        is_group_admin: bool,
    ) -> AppResult<GroupMembership> {
        self.require_group_admin(principal, group_id).await?;
        let membership = self
            .store
            .put_membership(GroupMembership {
                group_id,
                user_id,
                is_group_admin,
            })
            .await?;
        info!(
            actor = %principal.user_id,
            %group_id,
            %user_id,
            is_group_admin,
            "Group member added"
        );
        Ok(membership)
    }

    /// Remove a member. Requires group admin or `ManageUsers`.
    pub async fn remove_member(
        &self,
        principal: &Principal,
        group_id: GroupId,
        user_id: UserId,
    ) -> AppResult<()> {
        self.require_group_admin(principal, group_id).await?;
        if !self.store.delete_membership(group_id, user_id).await? {
            return Err(AppError::not_found("Membership not found"));
        }
        info!(actor = %principal.user_id, %group_id, %user_id, "Group member removed");
        Ok(())
    }

    /// Members of a group. Visible to members and `ManageUsers` holders.
    pub async fn list_members(
        &self,
        principal: &Principal,
        group_id: GroupId,
    ) -> AppResult<Vec<GroupMembership>> {
        self.find_group(group_id).await?;
        let is_member = self
            .store
            .find_membership(group_id, principal.user_id)
            .await?
            .is_some();
        if !is_member && !self.enforcer.has(principal, Capability::ManageUsers) {
            return Err(AppError::not_found("Group not found"));
        }
        self.store.list_members(group_id).await
    }

    async fn find_group(&self, group_id: GroupId) -> AppResult<Group> {
        self.store
            .find_group(group_id)
            .await?
            .ok_or_else(|| AppError::not_found("Group not found"))
    }

    async fn require_group_admin(&self, principal: &Principal, group_id: GroupId) -> AppResult<()> {
        self.find_group(group_id).await?;
        if self.enforcer.has(principal, Capability::ManageUsers) {
            return Ok(());
        }
        let is_admin = self
            .store
            .find_membership(group_id, principal.user_id)
            .await?
            .is_some_and(|m| m.is_group_admin);
        if is_admin {
            Ok(())
        } else {
            Err(AppError::authorization(
                "Only a group admin may change membership",
            ))
        }
    }
}
