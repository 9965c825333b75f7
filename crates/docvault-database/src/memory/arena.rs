//! The in-memory state behind [`super::MemoryStore`].

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::{GrantId, GroupId, ResourceId, RoleId, UserId};
use docvault_entity::directory::{
    Capability, Group, GroupMembership, Role, RoleAssignment, RolePermission,
};
use docvault_entity::permission::{Grant, SubjectKind};
use docvault_entity::resource::{CreateResource, Resource, ResourceTree};
use docvault_entity::share::ShareToken;

use crate::store::DeleteSummary;

/// Every table of the in-memory backend.
///
/// Mutations run against a private copy inside
/// [`super::MemoryStore::transaction`], so a failing step leaves the
/// published state untouched.
#[derive(Debug, Clone, Default)]
pub struct MemoryArena {
    tree: ResourceTree,
    grants: HashMap<GrantId, Grant>,
    shares: HashMap<String, ShareToken>,
    groups: HashMap<GroupId, Group>,
    memberships: HashMap<(GroupId, UserId), GroupMembership>,
    roles: HashMap<RoleId, Role>,
    assignments: HashSet<RoleAssignment>,
    role_permissions: HashSet<RolePermission>,
}

impl MemoryArena {
    /// The resource tree.
    pub fn tree(&self) -> &ResourceTree {
        &self.tree
    }

    /// Insert a resource and its owner grant.
    pub fn create_resource(&mut self, input: CreateResource) -> AppResult<Resource> {
        let resource = input.into_resource();
        self.tree.insert(resource.clone())?;
        let grant = Grant::owner(resource.id, resource.owner_id);
        self.grants.insert(grant.id, grant);
        Ok(resource)
    }

    /// Rename a resource and rewrite its subtree's paths.
    pub fn rename_resource(&mut self, id: ResourceId, new_name: &str) -> AppResult<Resource> {
        self.tree.rename(id, new_name)
    }

    /// Remove a subtree, its grants, and its share tokens.
    pub fn delete_subtree(&mut self, id: ResourceId) -> AppResult<DeleteSummary> {
        if self.tree.get(id).is_none() {
            return Err(AppError::not_found("Resource not found"));
        }
        let removed: HashSet<ResourceId> = self
            .tree
            .remove_subtree(id)
            .into_iter()
            .map(|r| r.id)
            .collect();

        let grants_before = self.grants.len();
        self.grants.retain(|_, g| !removed.contains(&g.resource_id));
        let shares_before = self.shares.len();
        self.shares.retain(|_, s| !removed.contains(&s.resource_id));

        Ok(DeleteSummary {
            resources: removed.len() as u64,
            grants: (grants_before - self.grants.len()) as u64,
            share_tokens: (shares_before - self.shares.len()) as u64,
        })
    }

    /// Insert or replace a grant keyed by subject and resource.
    pub fn put_grant(&mut self, mut grant: Grant) -> AppResult<Grant> {
        if self.tree.get(grant.resource_id).is_none() {
            return Err(AppError::not_found("Resource not found"));
        }
        if let Some(existing) =
            self.find_grant(grant.subject_kind, grant.subject_id, grant.resource_id)
        {
            grant.id = existing.id;
            grant.is_owner = existing.is_owner;
            grant.created_at = existing.created_at;
        }
        self.grants.insert(grant.id, grant.clone());
        Ok(grant)
    }

    fn find_grant(
        &self,
        subject_kind: SubjectKind,
        subject_id: Uuid,
        resource_id: ResourceId,
    ) -> Option<&Grant> {
        self.grants.values().find(|g| {
            g.subject_kind == subject_kind
                && g.subject_id == subject_id
                && g.resource_id == resource_id
        })
    }

    /// Delete the grant for a subject on a resource.
    pub fn delete_grant(
        &mut self,
        subject_kind: SubjectKind,
        subject_id: Uuid,
        resource_id: ResourceId,
    ) -> bool {
        match self.find_grant(subject_kind, subject_id, resource_id).map(|g| g.id) {
            Some(id) => self.grants.remove(&id).is_some(),
            None => false,
        }
    }

    /// Grants attached to any of the given resources, oldest first.
    pub fn grants_for_resources(&self, resource_ids: &[ResourceId]) -> Vec<Grant> {
        let wanted: HashSet<&ResourceId> = resource_ids.iter().collect();
        let mut out: Vec<Grant> = self
            .grants
            .values()
            .filter(|g| wanted.contains(&g.resource_id))
            .cloned()
            .collect();
        out.sort_by_key(|g| g.created_at);
        out
    }

    /// Grants naming a subject, oldest first.
    pub fn grants_for_subject(&self, subject_kind: SubjectKind, subject_id: Uuid) -> Vec<Grant> {
        let mut out: Vec<Grant> = self
            .grants
            .values()
            .filter(|g| g.subject_kind == subject_kind && g.subject_id == subject_id)
            .cloned()
            .collect();
        out.sort_by_key(|g| g.created_at);
        out
    }

    /// Insert a share token.
    pub fn insert_share(&mut self, share: ShareToken) -> AppResult<ShareToken> {
        if self.tree.get(share.resource_id).is_none() {
            return Err(AppError::not_found("Resource not found"));
        }
        if self.shares.contains_key(&share.token) {
            return Err(AppError::conflict("Share token already exists"));
        }
        self.shares.insert(share.token.clone(), share.clone());
        Ok(share)
    }

    /// Find a share token.
    pub fn find_share(&self, token: &str) -> Option<&ShareToken> {
        self.shares.get(token)
    }

    /// Delete a share token.
    pub fn delete_share(&mut self, token: &str) -> bool {
        self.shares.remove(token).is_some()
    }

    /// Stamp a share token's last use.
    pub fn touch_share(&mut self, token: &str, at: DateTime<Utc>) {
        if let Some(share) = self.shares.get_mut(token) {
            share.last_used_at = Some(at);
        }
    }

    /// Share tokens referencing a resource, oldest first.
    pub fn shares_for_resource(&self, resource_id: ResourceId) -> Vec<ShareToken> {
        let mut out: Vec<ShareToken> = self
            .shares
            .values()
            .filter(|s| s.resource_id == resource_id)
            .cloned()
            .collect();
        out.sort_by_key(|s| s.created_at);
        out
    }

    /// Insert a group.
    pub fn create_group(&mut self, group: Group) -> AppResult<Group> {
        if self.groups.values().any(|g| g.name == group.name) {
            return Err(AppError::conflict(format!(
                "Group '{}' already exists",
                group.name
            )));
        }
        self.groups.insert(group.id, group.clone());
        Ok(group)
    }

    /// Find a group.
    pub fn find_group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    /// Insert or update a membership.
    pub fn put_membership(&mut self, membership: GroupMembership) -> AppResult<GroupMembership> {
        if !self.groups.contains_key(&membership.group_id) {
            return Err(AppError::not_found("Group not found"));
        }
        self.memberships
            .insert((membership.group_id, membership.user_id), membership.clone());
        Ok(membership)
    }

    /// Remove a membership.
    pub fn delete_membership(&mut self, group_id: GroupId, user_id: UserId) -> bool {
        self.memberships.remove(&(group_id, user_id)).is_some()
    }

    /// Find a membership.
    pub fn find_membership(&self, group_id: GroupId, user_id: UserId) -> Option<&GroupMembership> {
        self.memberships.get(&(group_id, user_id))
    }

    /// Members of a group.
    pub fn list_members(&self, group_id: GroupId) -> Vec<GroupMembership> {
        let mut out: Vec<GroupMembership> = self
            .memberships
            .values()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect();
        out.sort_by_key(|m| m.user_id);
        out
    }

    /// Groups a user belongs to.
    pub fn groups_for_user(&self, user_id: UserId) -> Vec<GroupId> {
        let mut out: Vec<GroupId> = self
            .memberships
            .keys()
            .filter(|(_, member)| *member == user_id)
            .map(|(group, _)| *group)
            .collect();
        out.sort();
        out
    }

    /// Insert a role with its capabilities.
    pub fn create_role(&mut self, role: Role, capabilities: &[Capability]) -> AppResult<Role> {
        if self.find_role_by_name(&role.name).is_some() {
            return Err(AppError::conflict(format!(
                "Role '{}' already exists",
                role.name
            )));
        }
        for capability in capabilities {
            self.role_permissions.insert(RolePermission {
                role_id: role.id,
                capability: *capability,
            });
        }
        self.roles.insert(role.id, role.clone());
        Ok(role)
    }

    /// Find a role by id.
    pub fn find_role(&self, id: RoleId) -> Option<&Role> {
        self.roles.get(&id)
    }

    /// Find a role by name.
    pub fn find_role_by_name(&self, name: &str) -> Option<&Role> {
        self.roles.values().find(|r| r.name == name)
    }

    /// All roles, by name.
    pub fn list_roles(&self) -> Vec<Role> {
        let mut out: Vec<Role> = self.roles.values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Assign a role.
    pub fn assign_role(&mut self, assignment: RoleAssignment) -> AppResult<bool> {
        if !self.roles.contains_key(&assignment.role_id) {
            return Err(AppError::not_found("Role not found"));
        }
        Ok(self.assignments.insert(assignment))
    }

    /// Roles held by a user, by name.
    pub fn roles_for_user(&self, user_id: UserId) -> Vec<Role> {
        let mut out: Vec<Role> = self
            .assignments
            .iter()
            .filter(|a| a.user_id == user_id)
            .filter_map(|a| self.roles.get(&a.role_id).cloned())
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Distinct capabilities of the given roles.
    pub fn capabilities_for_roles(&self, role_ids: &[RoleId]) -> Vec<Capability> {
        self.role_permissions
            .iter()
            .filter(|p| role_ids.contains(&p.role_id))
            .map(|p| p.capability)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
