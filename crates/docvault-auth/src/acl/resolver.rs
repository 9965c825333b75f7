//! Effective permission resolution.
//!
//! The walk visits the resource's ancestor chain nearest-first. At each
//! level:
//! 1. A direct grant for the user decides the outcome, whatever its level.
//! 2. Otherwise group and role grants for the principal decide it; the
//!    highest level among them wins.
//! 3. Otherwise the walk continues upward.
//!
//! A grant found above the resource itself only applies when it is
//! inheritable; the principal's own non-inheritable grant on an ancestor
//! stops the walk with `None`. Grants naming other subjects never affect the
//! walk. Reaching the root without a match yields `None`.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use docvault_core::config::AccessConfig;
use docvault_core::result::AppResult;
use docvault_core::types::ResourceId;
use docvault_database::Store;
use docvault_entity::permission::{Grant, PermissionLevel};
use docvault_entity::resource::Resource;

use crate::principal::Principal;

/// Which kind of grant decided an effective permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionSource {
    /// A grant naming the user.
    Direct,
    /// One or more grants naming the user's groups or roles.
    Group,
    /// An inheritance barrier stopped the walk.
    Blocked,
    /// No grant matched up to the root.
    Denied,
}

/// Result of resolving a principal's permission on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermission {
    /// The resolved level.
    pub level: PermissionLevel,
    /// Whether the principal may re-share.
    pub can_share: bool,
    /// What decided the outcome.
    pub source: PermissionSource,
    /// The resource whose grants decided the outcome, if any.
    pub decided_at: Option<ResourceId>,
}

impl EffectivePermission {
    /// No access.
    pub fn none(source: PermissionSource, decided_at: Option<ResourceId>) -> Self {
        Self {
            level: PermissionLevel::None,
            can_share: false,
            source,
            decided_at,
        }
    }

    /// Whether the level is at least `required`.
    pub fn allows(&self, required: PermissionLevel) -> bool {
        !self.level.is_none() && self.level.has_at_least(required)
    }
}

/// Computes effective permissions from stored grants.
#[derive(Debug, Clone)]
pub struct PermissionResolver {
    store: Arc<dyn Store>,
    config: AccessConfig,
}

impl PermissionResolver {
    /// Creates a new resolver.
    pub fn new(store: Arc<dyn Store>, config: AccessConfig) -> Self {
        Self { store, config }
    }

    /// Resolve the principal's effective permission on a resource.
    ///
    /// A missing grant resolves to `None`; a missing resource is `NotFound`.
    /// A non-terminating ancestor chain fails with `CycleDetected`.
    pub async fn effective_permission(
        &self,
        principal: &Principal,
        resource_id: ResourceId,
    ) -> AppResult<EffectivePermission> {
        let max_depth = self.config.max_ancestor_depth;
        let tree = self.store.load_ancestry(resource_id, max_depth).await?;
        let chain = match tree.ancestors(resource_id, max_depth) {
            Ok(chain) => chain,
            Err(e) if e.is_fatal() => {
                error!(
                    resource_id = %resource_id,
                    error = %e,
                    "Ancestor walk did not terminate; resource hierarchy is corrupt"
                );
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let ids: Vec<ResourceId> = chain.iter().map(|r| r.id).collect();
        let grants = self.store.grants_for_resources(&ids).await?;
        let effective = resolve_chain(principal, &chain, &grants);

        debug!(
            user_id = %principal.user_id,
            resource_id = %resource_id,
            level = %effective.level,
            source = ?effective.source,
            "Resolved effective permission"
        );
        Ok(effective)
    }
}

/// Run the walk over a nearest-first chain with every grant on it.
pub fn resolve_chain(
    principal: &Principal,
    chain: &[&Resource],
    grants: &[Grant],
) -> EffectivePermission {
    let mut by_resource: HashMap<ResourceId, Vec<&Grant>> = HashMap::new();
    for grant in grants {
        by_resource.entry(grant.resource_id).or_default().push(grant);
    }

    for (depth, node) in chain.iter().enumerate() {
        let here = by_resource.get(&node.id).map(Vec::as_slice).unwrap_or(&[]);
        let applies = |g: &Grant| depth == 0 || g.inherit_from_parent;

        if let Some(direct) = here.iter().find(|g| principal.is_direct_subject(g)) {
            if !applies(*direct) {
                return EffectivePermission::none(PermissionSource::Blocked, Some(node.id));
            }
            return EffectivePermission {
                level: direct.permission_level,
                can_share: direct.allows_sharing(),
                source: PermissionSource::Direct,
                decided_at: Some(node.id),
            };
        }

        let indirect: Vec<&Grant> = here
            .iter()
            .copied()
            .filter(|g| principal.is_indirect_subject(g))
            .collect();
        if !indirect.is_empty() {
            let applicable: Vec<&Grant> = indirect.into_iter().filter(|g| applies(*g)).collect();
            let Some(level) = applicable.iter().map(|g| g.permission_level).max() else {
                return EffectivePermission::none(PermissionSource::Blocked, Some(node.id));
            };
            let can_share = applicable
                .iter()
                .filter(|g| g.permission_level == level)
                .any(|g| g.allows_sharing());
            return EffectivePermission {
                level,
                can_share,
                source: PermissionSource::Group,
                decided_at: Some(node.id),
            };
        }
    }

    EffectivePermission::none(PermissionSource::Denied, None)
}
