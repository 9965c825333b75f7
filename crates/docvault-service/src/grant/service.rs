//! Grant management: list, put, and revoke grants on a resource.
//!
//! Callers authorize the actor first; this service enforces the data rules
//! that hold whoever the actor is.

use std::sync::Arc;

use tracing::info;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::{ResourceId, UserId};
use docvault_database::Store;
use docvault_entity::permission::{Grant, NewGrant, PermissionLevel, Subject};

/// Manages grants attached to resources.
#[derive(Debug, Clone)]
pub struct GrantService {
    store: Arc<dyn Store>,
}

impl GrantService {
    /// Creates a new grant service.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// All grants attached to a resource.
    pub async fn list(&self, resource_id: ResourceId) -> AppResult<Vec<Grant>> {
        self.store.grants_for_resource(resource_id).await
    }

    /// Insert or replace the grant for `req.subject` on `req.resource_id`.
    ///
    /// A `None` level is rejected; use [`GrantService::revoke`] instead. The
    /// creation owner grant cannot be downgraded.
    pub async fn put(&self, actor: UserId, req: NewGrant) -> AppResult<Grant> {
        if req.permission_level.is_none() {
            return Err(AppError::validation(
                "A grant must carry a level; revoke it instead",
            ));
        }
        self.ensure_subject_exists(&req.subject).await?;

        if let Some(existing) = self.find(req.resource_id, &req.subject).await? {
            if existing.is_owner && req.permission_level != PermissionLevel::Owner {
                return Err(AppError::conflict("The owner grant cannot be downgraded"));
            }
        }

        let subject = req.subject;
        let grant = self.store.put_grant(req.into_grant()).await?;
        info!(
            actor = %actor,
            resource_id = %grant.resource_id,
            subject_kind = %subject.kind(),
            subject_id = %subject.id(),
            level = %grant.permission_level,
            inherit = grant.inherit_from_parent,
            can_share = grant.can_share,
            "Grant put"
        );
        Ok(grant)
    }

    /// Delete the grant for `subject` on a resource.
    pub async fn revoke(
        &self,
        actor: UserId,
        resource_id: ResourceId,
        subject: Subject,
    ) -> AppResult<()> {
        let existing = self
            .find(resource_id, &subject)
            .await?
            .ok_or_else(|| AppError::not_found("Grant not found"))?;
        if existing.is_owner {
            return Err(AppError::conflict("The owner grant cannot be revoked"));
        }

        self.store
            .delete_grant(subject.kind(), subject.id(), resource_id)
            .await?;
        info!(
            actor = %actor,
            resource_id = %resource_id,
            subject_kind = %subject.kind(),
            subject_id = %subject.id(),
            "Grant revoked"
        );
        Ok(())
    }

    async fn find(&self, resource_id: ResourceId, subject: &Subject) -> AppResult<Option<Grant>> {
        Ok(self
            .store
            .grants_for_resource(resource_id)
            .await?
            .into_iter()
            .find(|g| g.is_for(subject)))
    }

    async fn ensure_subject_exists(&self, subject: &Subject) -> AppResult<()> {
        match subject {
            // Users live with the identity provider.
            Subject::User(_) => Ok(()),
            Subject::Group(id) => self
                .store
                .find_group(*id)
                .await?
                .map(|_| ())
                .ok_or_else(|| AppError::not_found("Group not found")),
            Subject::Role(id) => self
                .store
                .find_role(*id)
                .await?
                .map(|_| ())
                .ok_or_else(|| AppError::not_found("Role not found")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_core::error::ErrorKind;
    use docvault_core::types::GroupId;
    use docvault_database::{DirectoryRepository, MemoryStore, ResourceRepository};
    use docvault_entity::directory::Group;
    use docvault_entity::resource::CreateResource;

    async fn setup() -> (Arc<MemoryStore>, GrantService, UserId, ResourceId) {
        let store = Arc::new(MemoryStore::new());
        let owner = UserId::new();
        let root = store
            .create_resource(CreateResource::root(owner))
            .await
            .expect("root");
        let grants = GrantService::new(store.clone());
        (store, grants, owner, root.id)
    }

    fn editor(subject: Subject, resource_id: ResourceId) -> NewGrant {
        NewGrant {
            subject,
            resource_id,
            permission_level: PermissionLevel::Editor,
            inherit_from_parent: true,
            can_share: false,
        }
    }

    #[tokio::test]
    async fn test_put_then_revoke() {
        let (_store, grants, owner, root) = setup().await;
        let guest = Subject::User(UserId::new());

        grants.put(owner, editor(guest, root)).await.expect("put");
        let mut upgraded = editor(guest, root);
        upgraded.permission_level = PermissionLevel::Owner;
        grants.put(owner, upgraded).await.expect("upsert");

        let listed = grants.list(root).await.expect("list");
        assert_eq!(listed.len(), 2);
        assert!(
            listed
                .iter()
                .any(|g| g.is_for(&guest) && g.permission_level == PermissionLevel::Owner)
        );

        grants.revoke(owner, root, guest).await.expect("revoke");
        assert_eq!(grants.list(root).await.expect("list").len(), 1);
        assert_eq!(
            grants.revoke(owner, root, guest).await.expect_err("gone").kind,
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_owner_grant_is_protected() {
        let (_store, grants, owner, root) = setup().await;
        let subject = Subject::User(owner);

        let err = grants
            .put(owner, editor(subject, root))
            .await
            .expect_err("downgrade");
        assert_eq!(err.kind, ErrorKind::Conflict);
        let err = grants.revoke(owner, root, subject).await.expect_err("revoke");
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_group_subject_must_exist() {
        let (store, grants, owner, root) = setup().await;
        let err = grants
            .put(owner, editor(Subject::Group(GroupId::new()), root))
            .await
            .expect_err("unknown group");
        assert_eq!(err.kind, ErrorKind::NotFound);

        let group = store
            .create_group(Group::new("staff"), owner)
            .await
            .expect("group");
        assert!(grants.put(owner, editor(Subject::Group(group.id), root)).await.is_ok());
    }

    #[tokio::test]
    async fn test_none_level_is_rejected() {
        let (_store, grants, owner, root) = setup().await;
        let mut req = editor(Subject::User(UserId::new()), root);
        req.permission_level = PermissionLevel::None;
        assert_eq!(
            grants.put(owner, req).await.expect_err("none").kind,
            ErrorKind::Validation
        );
    }
}
