//! In-memory backend.

pub mod arena;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use docvault_core::result::AppResult;
use docvault_core::types::{GroupId, ResourceId, RoleId, UserId};
use docvault_entity::directory::{Capability, Group, GroupMembership, Role, RoleAssignment};
use docvault_entity::permission::{Grant, SubjectKind};
use docvault_entity::resource::{CreateResource, Resource, ResourceTree};
use docvault_entity::share::ShareToken;

use crate::store::{
    DeleteSummary, DirectoryRepository, GrantRepository, ResourceRepository, ShareTokenRepository,
    StoreHealth,
};

pub use arena::MemoryArena;

/// Store keeping every table in one [`MemoryArena`] behind a lock.
///
/// Writes are copy-on-write: a transaction mutates a clone of the arena and
/// publishes it only when every step succeeded.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    arena: Arc<RwLock<MemoryArena>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against a private copy of the arena and publish the copy only
    /// if `f` returns `Ok`. An `Err` leaves the store exactly as it was.
    pub async fn transaction<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut MemoryArena) -> AppResult<T>,
    {
        let mut guard = self.arena.write().await;
        let mut draft = guard.clone();
        match f(&mut draft) {
            Ok(value) => {
                *guard = draft;
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, "Memory transaction rolled back");
                Err(err)
            }
        }
    }

    async fn read<T>(&self, f: impl FnOnce(&MemoryArena) -> T) -> T {
        let guard = self.arena.read().await;
        f(&guard)
    }

    /// Mutate the published arena in place. Only for single infallible
    /// updates that cannot leave a partial state behind.
    async fn write<T>(&self, f: impl FnOnce(&mut MemoryArena) -> T) -> T {
        let mut guard = self.arena.write().await;
        f(&mut guard)
    }
}

#[async_trait]
impl ResourceRepository for MemoryStore {
    async fn find_resource(&self, id: ResourceId) -> AppResult<Option<Resource>> {
        Ok(self.read(|a| a.tree().get(id).cloned()).await)
    }

    async fn find_by_path(&self, owner_id: UserId, path: &str) -> AppResult<Option<Resource>> {
        Ok(self
            .read(|a| a.tree().find_by_path(owner_id, path).cloned())
            .await)
    }

    async fn find_child(&self, parent_id: ResourceId, name: &str) -> AppResult<Option<Resource>> {
        Ok(self
            .read(|a| a.tree().find_child(parent_id, name).cloned())
            .await)
    }

    async fn list_children(&self, parent_id: ResourceId) -> AppResult<Vec<Resource>> {
        Ok(self
            .read(|a| a.tree().children(parent_id).into_iter().cloned().collect())
            .await)
    }

    async fn load_ancestry(&self, id: ResourceId, max_depth: usize) -> AppResult<ResourceTree> {
        let rows = self
            .read(|a| {
                let mut rows = Vec::new();
                let mut seen = HashSet::new();
                let mut cursor = Some(id);
                while let Some(current) = cursor {
                    if rows.len() > max_depth || !seen.insert(current) {
                        break;
                    }
                    let Some(node) = a.tree().get(current) else {
                        break;
                    };
                    rows.push(node.clone());
                    cursor = node.parent_id;
                }
                rows
            })
            .await;
        Ok(ResourceTree::from_rows(rows))
    }

    async fn create_resource(&self, resource: CreateResource) -> AppResult<Resource> {
        self.transaction(|a| a.create_resource(resource)).await
    }

    async fn rename_resource(&self, id: ResourceId, new_name: &str) -> AppResult<Resource> {
        self.transaction(|a| a.rename_resource(id, new_name)).await
    }

    async fn delete_subtree(&self, id: ResourceId) -> AppResult<DeleteSummary> {
        self.transaction(|a| a.delete_subtree(id)).await
    }
}

#[async_trait]
impl GrantRepository for MemoryStore {
    async fn put_grant(&self, grant: Grant) -> AppResult<Grant> {
        self.transaction(|a| a.put_grant(grant)).await
    }

    async fn delete_grant(
        &self,
        subject_kind: SubjectKind,
        subject_id: Uuid,
        resource_id: ResourceId,
    ) -> AppResult<bool> {
        self.transaction(|a| Ok(a.delete_grant(subject_kind, subject_id, resource_id)))
            .await
    }

    async fn grants_for_resource(&self, resource_id: ResourceId) -> AppResult<Vec<Grant>> {
        Ok(self.read(|a| a.grants_for_resources(&[resource_id])).await)
    }

    async fn grants_for_resources(&self, resource_ids: &[ResourceId]) -> AppResult<Vec<Grant>> {
        Ok(self.read(|a| a.grants_for_resources(resource_ids)).await)
    }

    async fn grants_for_subject(
        &self,
        subject_kind: SubjectKind,
        subject_id: Uuid,
    ) -> AppResult<Vec<Grant>> {
        Ok(self
            .read(|a| a.grants_for_subject(subject_kind, subject_id))
            .await)
    }
}

#[async_trait]
impl ShareTokenRepository for MemoryStore {
    async fn insert_share(&self, share: ShareToken) -> AppResult<ShareToken> {
        self.transaction(|a| a.insert_share(share)).await
    }

    async fn find_share(&self, token: &str) -> AppResult<Option<ShareToken>> {
        Ok(self.read(|a| a.find_share(token).cloned()).await)
    }

    async fn delete_share(&self, token: &str) -> AppResult<bool> {
        self.transaction(|a| Ok(a.delete_share(token))).await
    }

    async fn touch_share(&self, token: &str, at: DateTime<Utc>) -> AppResult<()> {
        self.write(|a| a.touch_share(token, at)).await;
        Ok(())
    }

    async fn shares_for_resource(&self, resource_id: ResourceId) -> AppResult<Vec<ShareToken>> {
        Ok(self.read(|a| a.shares_for_resource(resource_id)).await)
    }
}

#[async_trait]
impl DirectoryRepository for MemoryStore {
    async fn create_group(&self, group: Group, admin: UserId) -> AppResult<Group> {
        self.transaction(|a| {
            let group = a.create_group(group)?;
            a.put_membership(GroupMembership {
                group_id: group.id,
                user_id: admin,
                is_group_admin: true,
            })?;
            Ok(group)
        })
        .await
    }

    async fn find_group(&self, id: GroupId) -> AppResult<Option<Group>> {
        Ok(self.read(|a| a.find_group(id).cloned()).await)
    }

    async fn put_membership(&self, membership: GroupMembership) -> AppResult<GroupMembership> {
        self.transaction(|a| a.put_membership(membership)).await
    }

    async fn delete_membership(&self, group_id: GroupId, user_id: UserId) -> AppResult<bool> {
        self.transaction(|a| Ok(a.delete_membership(group_id, user_id)))
            .await
    }

    async fn find_membership(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> AppResult<Option<GroupMembership>> {
        Ok(self
            .read(|a| a.find_membership(group_id, user_id).cloned())
            .await)
    }

    async fn list_members(&self, group_id: GroupId) -> AppResult<Vec<GroupMembership>> {
        Ok(self.read(|a| a.list_members(group_id)).await)
    }

    async fn groups_for_user(&self, user_id: UserId) -> AppResult<Vec<GroupId>> {
        Ok(self.read(|a| a.groups_for_user(user_id)).await)
    }

    async fn create_role(&self, role: Role, capabilities: &[Capability]) -> AppResult<Role> {
        self.transaction(|a| a.create_role(role, capabilities)).await
    }

    async fn find_role(&self, id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.read(|a| a.find_role(id).cloned()).await)
    }

    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        Ok(self.read(|a| a.find_role_by_name(name).cloned()).await)
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        Ok(self.read(|a| a.list_roles()).await)
    }

    async fn assign_role(&self, assignment: RoleAssignment) -> AppResult<bool> {
        self.transaction(|a| a.assign_role(assignment)).await
    }

    async fn roles_for_user(&self, user_id: UserId) -> AppResult<Vec<Role>> {
        Ok(self.read(|a| a.roles_for_user(user_id)).await)
    }

    async fn capabilities_for_roles(&self, role_ids: &[RoleId]) -> AppResult<Vec<Capability>> {
        Ok(self.read(|a| a.capabilities_for_roles(role_ids)).await)
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn close(&self) {
        debug!("Memory store closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use docvault_core::error::AppError;
    use docvault_entity::permission::{NewGrant, PermissionLevel, Subject};

    async fn seeded(store: &MemoryStore) -> (Resource, Resource, Resource) {
        let owner = UserId::new();
        let root = store
            .create_resource(CreateResource::root(owner))
            .await
            .expect("root");
        let docs = store
            .create_resource(CreateResource::folder(&root, "docs"))
            .await
            .expect("docs");
        let file = store
            .create_resource(CreateResource::file(&docs, "a.txt", None, Some(1)))
            .await
            .expect("file");
        (root, docs, file)
    }

    fn share(resource_id: ResourceId, issued_by: UserId) -> ShareToken {
        ShareToken {
            token: Uuid::new_v4().simple().to_string(),
            resource_id,
            permission_level: PermissionLevel::Viewer,
            password_hash: None,
            expires_at: Some(Utc::now() + Duration::hours(1)),
            issued_by,
            created_at: Utc::now(),
            last_used_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_writes_owner_grant() {
        let store = MemoryStore::new();
        let (_, _, file) = seeded(&store).await;
        let grants = store.grants_for_resource(file.id).await.expect("grants");
        assert_eq!(grants.len(), 1);
        assert!(grants[0].is_owner);
        assert_eq!(grants[0].subject(), Subject::User(file.owner_id));
    }

    #[tokio::test]
    async fn test_failed_create_leaves_no_owner_grant() {
        let store = MemoryStore::new();
        let (root, docs, _) = seeded(&store).await;
        let err = store
            .create_resource(CreateResource::folder(&root, "docs"))
            .await
            .expect_err("duplicate");
        assert!(err.is_conflict());
        let owned = store
            .grants_for_subject(SubjectKind::User, docs.owner_id.into_uuid())
            .await
            .expect("grants");
        assert_eq!(owned.len(), 3);
    }

    #[tokio::test]
    async fn test_put_grant_upserts_by_subject() {
        let store = MemoryStore::new();
        let (_, docs, _) = seeded(&store).await;
        let subject = Subject::User(UserId::new());
        let first = store
            .put_grant(
                NewGrant {
                    subject,
                    resource_id: docs.id,
                    permission_level: PermissionLevel::Viewer,
                    inherit_from_parent: true,
                    can_share: false,
                }
                .into_grant(),
            )
            .await
            .expect("put");
        let second = store
            .put_grant(
                NewGrant {
                    subject,
                    resource_id: docs.id,
                    permission_level: PermissionLevel::Editor,
                    inherit_from_parent: true,
                    can_share: true,
                }
                .into_grant(),
            )
            .await
            .expect("upsert");
        assert_eq!(first.id, second.id);
        assert_eq!(store.grants_for_resource(docs.id).await.expect("list").len(), 2);
        assert!(
            store
                .delete_grant(subject.kind(), subject.id(), docs.id)
                .await
                .expect("delete")
        );
    }

    #[tokio::test]
    async fn test_delete_cascades_grants_and_shares() {
        let store = MemoryStore::new();
        let (root, docs, file) = seeded(&store).await;
        let token = store
            .insert_share(share(file.id, file.owner_id))
            .await
            .expect("share");

        let summary = store.delete_subtree(docs.id).await.expect("delete");
        assert_eq!(
            summary,
            DeleteSummary {
                resources: 2,
                grants: 2,
                share_tokens: 1
            }
        );
        assert!(store.find_resource(file.id).await.expect("find").is_none());
        assert!(store.find_share(&token.token).await.expect("find").is_none());
        assert!(store.find_resource(root.id).await.expect("find").is_some());
    }

    #[tokio::test]
    async fn test_failed_transaction_keeps_prior_state() {
        let store = MemoryStore::new();
        let (_, docs, file) = seeded(&store).await;
        let token = store
            .insert_share(share(file.id, file.owner_id))
            .await
            .expect("share");

        let err = store
            .transaction(|arena| {
                arena.delete_subtree(docs.id)?;
                Err::<(), _>(AppError::internal("simulated failure mid-cascade"))
            })
            .await
            .expect_err("rolled back");
        assert_eq!(err.message, "simulated failure mid-cascade");

        assert!(store.find_resource(file.id).await.expect("find").is_some());
        assert_eq!(store.grants_for_resource(file.id).await.expect("grants").len(), 1);
        assert!(store.find_share(&token.token).await.expect("find").is_some());
    }

    #[tokio::test]
    async fn test_touch_share_stamps_in_place() {
        let store = MemoryStore::new();
        let (_, _, file) = seeded(&store).await;
        let token = store
            .insert_share(share(file.id, file.owner_id))
            .await
            .expect("share");
        let at = Utc::now();

        store.touch_share(&token.token, at).await.expect("touch");
        let found = store
            .find_share(&token.token)
            .await
            .expect("find")
            .expect("present");
        assert_eq!(found.last_used_at, Some(at));
        assert!(store.touch_share("missing", at).await.is_ok());
        assert!(store.find_share("missing").await.expect("find").is_none());
    }

    #[tokio::test]
    async fn test_group_creation_is_atomic() {
        let store = MemoryStore::new();
        let admin = UserId::new();
        let group = store
            .create_group(Group::new("physics"), admin)
            .await
            .expect("group");
        let membership = store
            .find_membership(group.id, admin)
            .await
            .expect("find")
            .expect("admin membership");
        assert!(membership.is_group_admin);

        let other = UserId::new();
        let err = store
            .create_group(Group::new("physics"), other)
            .await
            .expect_err("duplicate");
        assert!(err.is_conflict());
        assert!(store.groups_for_user(other).await.expect("groups").is_empty());
    }

    #[tokio::test]
    async fn test_load_ancestry_is_bounded() {
        let store = MemoryStore::new();
        let (root, docs, file) = seeded(&store).await;
        let tree = store.load_ancestry(file.id, 8).await.expect("load");
        let chain: Vec<ResourceId> = tree
            .ancestors(file.id, 8)
            .expect("chain")
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(chain, vec![file.id, docs.id, root.id]);

        let short = store.load_ancestry(file.id, 1).await.expect("load");
        assert_eq!(short.len(), 2);
        assert!(short.ancestors(file.id, 1).expect_err("too deep").is_fatal());
    }

    #[tokio::test]
    async fn test_roles_and_capabilities() {
        let store = MemoryStore::new();
        let role = store
            .create_role(
                Role::new("teacher", None),
                &[Capability::UploadContent, Capability::DeleteContent],
            )
            .await
            .expect("role");
        assert!(
            store
                .create_role(Role::new("teacher", None), &[])
                .await
                .expect_err("dup")
                .is_conflict()
        );

        let user = UserId::new();
        let assignment = RoleAssignment {
            user_id: user,
            role_id: role.id,
        };
        assert!(store.assign_role(assignment).await.expect("assign"));
        assert!(!store.assign_role(assignment).await.expect("again"));
        let caps = store
            .capabilities_for_roles(&[role.id])
            .await
            .expect("caps");
        assert_eq!(caps, vec![Capability::UploadContent, Capability::DeleteContent]);
        assert_eq!(store.roles_for_user(user).await.expect("roles"), vec![role]);
    }
}
