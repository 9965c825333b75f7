//! Persistence contracts shared by every backend.
//!
//! The repositories are dumb stores: no permission merging or path policy
//! lives here. The only composite operations are the ones that must be
//! atomic, namely creating a resource together with its owner grant and
//! deleting a subtree together with its grants and share tokens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use docvault_core::result::AppResult;
use docvault_core::types::{GroupId, ResourceId, RoleId, UserId};
use docvault_entity::directory::{Capability, Group, GroupMembership, Role, RoleAssignment};
use docvault_entity::permission::{Grant, SubjectKind};
use docvault_entity::resource::{CreateResource, Resource, ResourceTree};
use docvault_entity::share::ShareToken;

/// Rows removed by a cascading delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    /// Resources removed, the target included.
    pub resources: u64,
    /// Grants removed with them.
    pub grants: u64,
    /// Share tokens removed with them.
    pub share_tokens: u64,
}

/// Storage of files and folders.
#[async_trait]
pub trait ResourceRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Find a resource by id.
    async fn find_resource(&self, id: ResourceId) -> AppResult<Option<Resource>>;

    /// Find a resource by owner and canonical path.
    async fn find_by_path(&self, owner_id: UserId, path: &str) -> AppResult<Option<Resource>>;

    /// Find a direct child of a folder by name.
    async fn find_child(&self, parent_id: ResourceId, name: &str) -> AppResult<Option<Resource>>;

    /// List the direct children of a folder.
    async fn list_children(&self, parent_id: ResourceId) -> AppResult<Vec<Resource>>;

    /// Load the ancestor chain of `id` (at most `max_depth + 1` rows) into a
    /// tree. The chain is not validated; callers walk it with
    /// [`ResourceTree::ancestors`].
    async fn load_ancestry(&self, id: ResourceId, max_depth: usize) -> AppResult<ResourceTree>;

    /// Insert a resource and its owner grant as one atomic unit.
    ///
    /// Fails with `Conflict` when the owner already has a resource at the
    /// same canonical path.
    async fn create_resource(&self, resource: CreateResource) -> AppResult<Resource>;

    /// Rename a resource, rewriting its descendants' paths atomically.
    async fn rename_resource(&self, id: ResourceId, new_name: &str) -> AppResult<Resource>;

    /// Delete a resource, its descendants, their grants, and every share
    /// token referencing them, all or nothing.
    async fn delete_subtree(&self, id: ResourceId) -> AppResult<DeleteSummary>;
}

/// Storage of permission grants.
#[async_trait]
pub trait GrantRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Insert or replace the grant for the same subject and resource.
    async fn put_grant(&self, grant: Grant) -> AppResult<Grant>;

    /// Delete the grant for a subject on a resource. Returns `true` if deleted.
    async fn delete_grant(
        &self,
        subject_kind: SubjectKind,
        subject_id: Uuid,
        resource_id: ResourceId,
    ) -> AppResult<bool>;

    /// All grants attached to a resource.
    async fn grants_for_resource(&self, resource_id: ResourceId) -> AppResult<Vec<Grant>>;

    /// All grants attached to any of the given resources.
    async fn grants_for_resources(&self, resource_ids: &[ResourceId]) -> AppResult<Vec<Grant>>;

    /// All grants naming a subject.
    async fn grants_for_subject(
        &self,
        subject_kind: SubjectKind,
        subject_id: Uuid,
    ) -> AppResult<Vec<Grant>>;
}

/// Storage of share tokens.
#[async_trait]
pub trait ShareTokenRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new token. Fails with `Conflict` if the token string exists.
    async fn insert_share(&self, share: ShareToken) -> AppResult<ShareToken>;

    /// Find a token.
    async fn find_share(&self, token: &str) -> AppResult<Option<ShareToken>>;

    /// Delete a token. Returns `true` if deleted.
    async fn delete_share(&self, token: &str) -> AppResult<bool>;

    /// Record a successful validation.
    async fn touch_share(&self, token: &str, at: DateTime<Utc>) -> AppResult<()>;

    /// All tokens referencing a resource.
    async fn shares_for_resource(&self, resource_id: ResourceId) -> AppResult<Vec<ShareToken>>;
}

/// Storage of groups, roles, and their memberships.
#[async_trait]
pub trait DirectoryRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a group together with `admin` as its first group admin, as one
    /// atomic unit. Fails with `Conflict` on a duplicate name.
    async fn create_group(&self, group: Group, admin: UserId) -> AppResult<Group>;

    /// Find a group by id.
    async fn find_group(&self, id: GroupId) -> AppResult<Option<Group>>;

    /// Insert or update a membership.
    async fn put_membership(&self, membership: GroupMembership) -> AppResult<GroupMembership>;

    /// Remove a membership. Returns `true` if removed.
    async fn delete_membership(&self, group_id: GroupId, user_id: UserId) -> AppResult<bool>;

    /// Find one membership.
    async fn find_membership(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> AppResult<Option<GroupMembership>>;

    /// All members of a group.
    async fn list_members(&self, group_id: GroupId) -> AppResult<Vec<GroupMembership>>;

    /// Ids of every group a user belongs to.
    async fn groups_for_user(&self, user_id: UserId) -> AppResult<Vec<GroupId>>;

    /// Insert a role with its capabilities. Fails with `Conflict` on a
    /// duplicate name.
    async fn create_role(&self, role: Role, capabilities: &[Capability]) -> AppResult<Role>;

    /// Find a role by id.
    async fn find_role(&self, id: RoleId) -> AppResult<Option<Role>>;

    /// Find a role by name.
    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>>;

    /// All roles, by name.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Assign a role. Returns `false` if the user already held it.
    async fn assign_role(&self, assignment: RoleAssignment) -> AppResult<bool>;

    /// Roles held by a user, by name.
    async fn roles_for_user(&self, user_id: UserId) -> AppResult<Vec<Role>>;

    /// Distinct capabilities carried by any of the given roles.
    async fn capabilities_for_roles(&self, role_ids: &[RoleId]) -> AppResult<Vec<Capability>>;
}

/// Liveness and shutdown of the backend itself.
#[async_trait]
pub trait StoreHealth: Send + Sync + std::fmt::Debug + 'static {
    /// Round-trip to the backend; fails when it cannot serve requests.
    async fn ping(&self) -> AppResult<()>;

    /// Release backend connections once serving has stopped.
    async fn close(&self);
}

/// A complete backend.
pub trait Store:
    ResourceRepository
    + GrantRepository
    + ShareTokenRepository
    + DirectoryRepository
    + StoreHealth
{
}

impl<T> Store for T where
    T: ResourceRepository
        + GrantRepository
        + ShareTokenRepository
        + DirectoryRepository
        + StoreHealth
{
}
