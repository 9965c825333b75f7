//! The single entry point route handlers call.
//!
//! Every operation authorizes first and only then touches the path tree,
//! grants, or share tokens. A caller with no visibility on the target gets
//! `NotFound`, never `Unauthorized`, so existence cannot be probed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use docvault_auth::{CapabilityEnforcer, PasswordHasher, PermissionResolver, Principal};
use docvault_core::config::{AccessConfig, PathConfig, ShareConfig};
use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::types::ResourceId;
use docvault_database::{DeleteSummary, Store};
use docvault_entity::directory::Capability;
use docvault_entity::permission::{Grant, NewGrant, PermissionLevel, Subject};
use docvault_entity::resource::{Resource, join_path};
use docvault_entity::share::ShareToken;

use super::action::Action;
use super::decision::{Credential, Decision, DenyReason, ResourceRef};
use crate::grant::GrantService;
use crate::path::PathResolver;
use crate::path::normalize::validate_segment;
use crate::share::{IssueShare, ShareTokenService};

/// A resource as seen by the caller, with its children when it is a folder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Browse {
    /// The resource itself.
    pub resource: Resource,
    /// The caller's level on it.
    pub level: PermissionLevel,
    /// Child folders, by name. Empty for files.
    pub subfolders: Vec<Resource>,
    /// Child files, by name. Empty for files.
    pub files: Vec<Resource>,
}

/// Metadata of a file being stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFile {
    /// Requested name. Renamed on conflict.
    pub name: String,
    /// MIME type.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Size in bytes.
    #[serde(default)]
    pub size_bytes: Option<i64>,
}

/// Share token parameters; the resource comes from the target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareRequest {
    /// Level the token grants.
    pub permission_level: PermissionLevel,
    /// Optional link password.
    #[serde(default)]
    pub password: Option<String>,
    /// Optional expiry.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Grant parameters; the resource comes from the target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantRequest {
    /// Who receives the grant.
    pub subject: Subject,
    /// Granted level.
    pub permission_level: PermissionLevel,
    /// Inheritance flag.
    #[serde(default = "default_true")]
    pub inherit_from_parent: bool,
    /// Re-share flag.
    #[serde(default)]
    pub can_share: bool,
}

fn default_true() -> bool {
    true
}

/// Composes path resolution, permission resolution, and share tokens into
/// one decision per request.
#[derive(Debug, Clone)]
pub struct AccessControlFacade {
    store: Arc<dyn Store>,
    paths: PathResolver,
    permissions: Arc<PermissionResolver>,
    shares: ShareTokenService,
    grants: GrantService,
    enforcer: CapabilityEnforcer,
    config: AccessConfig,
}

impl AccessControlFacade {
    /// Creates a new facade over `store`.
    pub fn new(
        store: Arc<dyn Store>,
        paths: PathConfig,
        shares: ShareConfig,
        access: AccessConfig,
    ) -> Self {
        let permissions = Arc::new(PermissionResolver::new(store.clone(), access.clone()));
        Self {
            paths: PathResolver::new(store.clone(), paths),
            shares: ShareTokenService::new(
                store.clone(),
                permissions.clone(),
                Arc::new(PasswordHasher::new()),
                shares,
            ),
            grants: GrantService::new(store.clone()),
            permissions,
            enforcer: CapabilityEnforcer::new(),
            config: access,
            store,
        }
    }

    /// Decide whether `credential` may perform `action` on `target`.
    ///
    /// Only integrity and infrastructure failures are errors; every
    /// authorization outcome is a [`Decision`].
    pub async fn authorize(
        &self,
        credential: &Credential,
        action: Action,
        target: &ResourceRef,
    ) -> AppResult<Decision> {
        Ok(self.evaluate(credential, action, target).await?.0)
    }

    async fn evaluate(
        &self,
        credential: &Credential,
        action: Action,
        target: &ResourceRef,
    ) -> AppResult<(Decision, Option<Resource>)> {
        let (decision, resource) = match credential {
            Credential::Principal(principal) => match self.locate(action, target).await? {
                Some(resource) => {
                    let decision = self.decide_for_principal(principal, action, &resource).await?;
                    (decision, Some(resource))
                }
                None => (self.decide_missing(principal, action, target), None),
            },
            Credential::ShareToken { token, password } => {
                let share = match self.validate_token(token, password.as_deref()).await? {
                    Ok(share) => share,
                    Err(reason) => return Ok((Decision::deny(reason), None)),
                };
                match self.locate(action, target).await? {
                    Some(resource) => {
                        let decision = self.decide_for_token(&share, action, &resource).await?;
                        (decision, Some(resource))
                    }
                    None => (Decision::deny(DenyReason::NotFound), None),
                }
            }
        };

        debug!(
            %action,
            resource_id = ?resource.as_ref().map(|r| r.id),
            allowed = decision.is_allowed(),
            "Authorization decided"
        );
        Ok((decision, resource))
    }

    /// The resource an action applies to. A create by path targets the
    /// deepest existing resource on the path.
    async fn locate(&self, action: Action, target: &ResourceRef) -> AppResult<Option<Resource>> {
        match target {
            ResourceRef::Id { id } => self.store.find_resource(*id).await,
            ResourceRef::Path { owner_id, path } if action == Action::Create => {
                let parsed = self.paths.parse(path)?;
                self.paths.nearest_existing(*owner_id, &parsed).await
            }
            ResourceRef::Path { owner_id, path } => {
                self.paths.resolve_resource(*owner_id, path).await
            }
        }
    }

    fn decide_missing(
        &self,
        principal: &Principal,
        action: Action,
        target: &ResourceRef,
    ) -> Decision {
        let ResourceRef::Path { owner_id, .. } = target else {
            return Decision::deny(DenyReason::NotFound);
        };
        if action != Action::Create {
            return Decision::deny(DenyReason::NotFound);
        }

        if principal.user_id == *owner_id {
            if self.config.require_upload_capability
                && !self.enforcer.has(principal, Capability::UploadContent)
            {
                return Decision::deny(DenyReason::InsufficientPermission);
            }
            return Decision::AllowNewScope { owner_id: *owner_id };
        }
        if self.enforcer.has(principal, Capability::ManageContent) {
            return Decision::AllowNewScope { owner_id: *owner_id };
        }
        Decision::deny(DenyReason::NotFound)
    }

    async fn decide_for_principal(
        &self,
        principal: &Principal,
        action: Action,
        resource: &Resource,
    ) -> AppResult<Decision> {
        let effective = self
            .permissions
            .effective_permission(principal, resource.id)
            .await?;
        let manages_content =
            action == Action::Create && self.enforcer.has(principal, Capability::ManageContent);
        if effective.level.is_none() && !manages_content {
            return Ok(Decision::deny(DenyReason::NotFound));
        }

        let allowed = match action {
            Action::Read | Action::List => effective.allows(action.required_level()),
            Action::Create => {
                (manages_content || effective.allows(action.required_level()))
                    && self.upload_allowed(principal, resource)
            }
            Action::Rename | Action::ManageGrants => effective.allows(action.required_level()),
            Action::Delete => {
                effective.allows(PermissionLevel::Owner)
                    || (effective.allows(PermissionLevel::Editor)
                        && self.enforcer.has(principal, Capability::DeleteContent))
            }
            Action::Share => effective.can_share,
        };

        Ok(if allowed {
            Decision::Allow {
                resource_id: resource.id,
                level: effective.level,
            }
        } else {
            Decision::deny(DenyReason::InsufficientPermission)
        })
    }

    fn upload_allowed(&self, principal: &Principal, parent: &Resource) -> bool {
        let under_own_root = parent.is_root() && parent.owner_id == principal.user_id;
        !(self.config.require_upload_capability && under_own_root)
            || self.enforcer.has(principal, Capability::UploadContent)
    }

    async fn validate_token(
        &self,
        token: &str,
        password: Option<&str>,
    ) -> AppResult<Result<ShareToken, DenyReason>> {
        match self.shares.validate(token, password).await {
            Ok(share) => Ok(Ok(share)),
            Err(e) => match e.kind {
                ErrorKind::NotFound => Ok(Err(DenyReason::NotFound)),
                ErrorKind::Expired => Ok(Err(DenyReason::Expired)),
                ErrorKind::InvalidPassword => Ok(Err(DenyReason::InvalidPassword)),
                _ => Err(e),
            },
        }
    }

    async fn decide_for_token(
        &self,
        share: &ShareToken,
        action: Action,
        resource: &Resource,
    ) -> AppResult<Decision> {
        if !self.in_scope(share, resource.id).await? {
            return Ok(Decision::deny(DenyReason::NotFound));
        }
        let level = share.permission_level;
        if !action.token_may() || !level.has_at_least(action.required_level()) {
            return Ok(Decision::deny(DenyReason::InsufficientPermission));
        }
        Ok(Decision::Allow {
            resource_id: resource.id,
            level,
        })
    }

    /// Whether `resource_id` is the shared resource or one of its descendants.
    async fn in_scope(&self, share: &ShareToken, resource_id: ResourceId) -> AppResult<bool> {
        if share.resource_id == resource_id {
            return Ok(true);
        }
        let max_depth = self.config.max_ancestor_depth;
        let tree = self.store.load_ancestry(resource_id, max_depth).await?;
        let chain = tree.ancestors(resource_id, max_depth).inspect_err(|e| {
            if e.is_fatal() {
                error!(
                    resource_id = %resource_id,
                    error = %e,
                    "Share scope walk did not terminate"
                );
            }
        })?;
        Ok(chain.iter().any(|r| r.id == share.resource_id))
    }

    /// Authorize or fail with the error the denial maps to. `what` names the
    /// target in `NotFound` messages.
    async fn require(
        &self,
        credential: &Credential,
        action: Action,
        target: &ResourceRef,
        what: &str,
    ) -> AppResult<(Decision, Option<Resource>)> {
        let (decision, resource) = self.evaluate(credential, action, target).await?;
        if let Decision::Deny { reason } = decision {
            return Err(reason.into_error(what));
        }
        Ok((decision, resource))
    }

    async fn require_existing(
        &self,
        credential: &Credential,
        action: Action,
        target: &ResourceRef,
        what: &str,
    ) -> AppResult<(Resource, PermissionLevel)> {
        match self.require(credential, action, target, what).await? {
            (Decision::Allow { level, .. }, Some(resource)) => Ok((resource, level)),
            _ => Err(DenyReason::NotFound.into_error(what)),
        }
    }

    fn principal<'a>(&self, credential: &'a Credential) -> AppResult<&'a Principal> {
        match credential {
            Credential::Principal(principal) => Ok(principal),
            Credential::ShareToken { .. } => Err(AppError::authorization("Unauthorized")),
        }
    }

    /// A resource and, for folders, its immediate children.
    pub async fn browse(&self, credential: &Credential, target: &ResourceRef) -> AppResult<Browse> {
        let (resource, level) = self
            .require_existing(credential, Action::List, target, "Resource")
            .await?;
        self.browse_resource(resource, level, self.principal(credential).ok())
            .await
    }

    /// Children are filtered to what `viewer` can see. A token sees every
    /// child of a folder in its scope.
    async fn browse_resource(
        &self,
        resource: Resource,
        level: PermissionLevel,
        viewer: Option<&Principal>,
    ) -> AppResult<Browse> {
        if !resource.is_folder() {
            return Ok(Browse {
                resource,
                level,
                subfolders: Vec::new(),
                files: Vec::new(),
            });
        }
        let listing = self.paths.list_folder(resource).await?;
        let (subfolders, files) = match viewer {
            Some(principal) => (
                self.visible_to(principal, listing.subfolders).await?,
                self.visible_to(principal, listing.files).await?,
            ),
            None => (listing.subfolders, listing.files),
        };
        Ok(Browse {
            resource: listing.folder,
            level,
            subfolders,
            files,
        })
    }

    async fn visible_to(
        &self,
        principal: &Principal,
        children: Vec<Resource>,
    ) -> AppResult<Vec<Resource>> {
        let mut visible = Vec::with_capacity(children.len());
        for child in children {
            let effective = self
                .permissions
                .effective_permission(principal, child.id)
                .await?;
            if !effective.level.is_none() {
                visible.push(child);
            }
        }
        Ok(visible)
    }

    /// The folder content is created in. A path target is materialized.
    async fn prepare_folder(
        &self,
        credential: &Credential,
        parent: &ResourceRef,
    ) -> AppResult<Resource> {
        let (_, resource) = self
            .require(credential, Action::Create, parent, "Folder")
            .await?;
        match parent {
            ResourceRef::Id { .. } => {
                let folder = resource.ok_or_else(|| AppError::not_found("Folder not found"))?;
                if !folder.is_folder() {
                    return Err(AppError::validation(format!(
                        "'{}' is not a folder",
                        folder.path
                    )));
                }
                Ok(folder)
            }
            ResourceRef::Path { owner_id, path } => {
                let parsed = self.paths.parse(path)?;
                self.paths.materialize_folders(*owner_id, &parsed).await
            }
        }
    }

    /// Create a folder named `name` in `parent`. Existing folders are
    /// returned as they are.
    pub async fn create_folder(
        &self,
        credential: &Credential,
        parent: &ResourceRef,
        name: &str,
    ) -> AppResult<Resource> {
        validate_segment(name, self.paths.config())?;
        let parent = self.prepare_folder(credential, parent).await?;
        let path = self.paths.parse(&join_path(&parent.path, name))?;
        self.paths.materialize_folders(parent.owner_id, &path).await
    }

    /// Store a file in `parent`, renaming it on conflict.
    pub async fn upload_file(
        &self,
        credential: &Credential,
        parent: &ResourceRef,
        file: NewFile,
    ) -> AppResult<Resource> {
        validate_segment(&file.name, self.paths.config())?;
        let folder = self.prepare_folder(credential, parent).await?;
        self.paths
            .place_file(&folder, &file.name, file.mime_type, file.size_bytes)
            .await
    }

    /// Rename a resource.
    pub async fn rename(
        &self,
        credential: &Credential,
        target: &ResourceRef,
        new_name: &str,
    ) -> AppResult<Resource> {
        let (resource, _) = self
            .require_existing(credential, Action::Rename, target, "Resource")
            .await?;
        self.paths.rename(resource.id, new_name).await
    }

    /// Delete a resource with its subtree, grants, and share tokens.
    pub async fn delete(
        &self,
        credential: &Credential,
        target: &ResourceRef,
    ) -> AppResult<DeleteSummary> {
        let (resource, _) = self
            .require_existing(credential, Action::Delete, target, "Resource")
            .await?;
        self.paths.delete(resource.id).await
    }

    /// Issue a share token for the target.
    pub async fn issue_share(
        &self,
        credential: &Credential,
        target: &ResourceRef,
        req: ShareRequest,
    ) -> AppResult<ShareToken> {
        let (resource, _) = self
            .require_existing(credential, Action::Share, target, "Resource")
            .await?;
        let issuer = self.principal(credential)?;
        self.shares
            .issue(
                issuer,
                IssueShare {
                    resource_id: resource.id,
                    permission_level: req.permission_level,
                    password: req.password,
                    expires_at: req.expires_at,
                },
            )
            .await
    }

    /// The resource behind a share link, browsed at the token's level.
    pub async fn share_info(&self, token: &str, password: Option<&str>) -> AppResult<Browse> {
        let share = self.shares.validate(token, password).await?;
        let resource = self
            .store
            .find_resource(share.resource_id)
            .await?
            .ok_or_else(|| AppError::not_found("Resource not found"))?;
        self.browse_resource(resource, share.permission_level, None)
            .await
    }

    /// Share tokens issued on the target. Owners see every token, other
    /// sharers only their own.
    pub async fn list_shares(
        &self,
        credential: &Credential,
        target: &ResourceRef,
    ) -> AppResult<Vec<ShareToken>> {
        let (resource, level) = self
            .require_existing(credential, Action::Share, target, "Resource")
            .await?;
        let caller = self.principal(credential)?.user_id;
        let mut shares = self.store.shares_for_resource(resource.id).await?;
        if level != PermissionLevel::Owner {
            shares.retain(|s| s.issued_by == caller);
        }
        Ok(shares)
    }

    /// Revoke a share token.
    pub async fn revoke_share(&self, credential: &Credential, token: &str) -> AppResult<()> {
        let principal = self.principal(credential)?;
        self.shares.revoke(principal, token).await
    }

    /// Grants attached to the target.
    pub async fn list_grants(
        &self,
        credential: &Credential,
        target: &ResourceRef,
    ) -> AppResult<Vec<Grant>> {
        let (resource, _) = self
            .require_existing(credential, Action::ManageGrants, target, "Resource")
            .await?;
        self.grants.list(resource.id).await
    }

    /// Insert or replace a grant on the target.
    pub async fn put_grant(
        &self,
        credential: &Credential,
        target: &ResourceRef,
        req: GrantRequest,
    ) -> AppResult<Grant> {
        let (resource, _) = self
            .require_existing(credential, Action::ManageGrants, target, "Resource")
            .await?;
        let actor = self.principal(credential)?.user_id;
        self.grants
            .put(
                actor,
                NewGrant {
                    subject: req.subject,
                    resource_id: resource.id,
                    permission_level: req.permission_level,
                    inherit_from_parent: req.inherit_from_parent,
                    can_share: req.can_share,
                },
            )
            .await
    }

    /// Revoke a subject's grant on the target.
    pub async fn revoke_grant(
        &self,
        credential: &Credential,
        target: &ResourceRef,
        subject: Subject,
    ) -> AppResult<()> {
        let (resource, _) = self
            .require_existing(credential, Action::ManageGrants, target, "Resource")
            .await?;
        let actor = self.principal(credential)?.user_id;
        self.grants.revoke(actor, resource.id, subject).await
    }
}
