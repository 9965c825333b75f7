//! Share token issuance, validation, and revocation.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use docvault_auth::{PasswordHasher, PermissionResolver, Principal};
use docvault_core::config::ShareConfig;
use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::ResourceId;
use docvault_database::Store;
use docvault_entity::permission::PermissionLevel;
use docvault_entity::share::ShareToken;

use super::token::TokenGenerator;

/// Ceiling applied to `max_lifetime_hours` (about a century).
const MAX_LIFETIME_CAP_HOURS: u64 = 24 * 366 * 100;

/// Request to issue a share token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueShare {
    /// The resource to share.
    pub resource_id: ResourceId,
    /// The level the token grants.
    pub permission_level: PermissionLevel,
    /// Optional link password. An empty string means no password.
    #[serde(default)]
    pub password: Option<String>,
    /// Optional expiry.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Issues and validates principal-independent share tokens.
///
/// A token's level is checked against the issuer only at issuance; later
/// changes to the issuer's own access do not affect tokens already issued.
#[derive(Debug, Clone)]
pub struct ShareTokenService {
    store: Arc<dyn Store>,
    resolver: Arc<PermissionResolver>,
    hasher: Arc<PasswordHasher>,
    generator: TokenGenerator,
    config: ShareConfig,
}

impl ShareTokenService {
    /// Creates a new share token service.
    pub fn new(
        store: Arc<dyn Store>,
        resolver: Arc<PermissionResolver>,
        hasher: Arc<PasswordHasher>,
        config: ShareConfig,
    ) -> Self {
        Self {
            store,
            resolver,
            hasher,
            generator: TokenGenerator::new(config.token_bytes),
            config,
        }
    }

    /// Issue a token for `req.resource_id`.
    ///
    /// The issuer needs an effective level of at least `req.permission_level`
    /// and the right to re-share.
    pub async fn issue(&self, issuer: &Principal, req: IssueShare) -> AppResult<ShareToken> {
        if req.permission_level.is_none() {
            return Err(AppError::validation("A share token must grant some access"));
        }

        let effective = self
            .resolver
            .effective_permission(issuer, req.resource_id)
            .await?;
        if effective.level.is_none() {
            return Err(AppError::not_found("Resource not found"));
        }
        if !effective.level.has_at_least(req.permission_level) || !effective.can_share {
            return Err(AppError::authorization(format!(
                "Insufficient permission to share at level '{}'",
                req.permission_level
            )));
        }

        let now = Utc::now();
        let expires_at = self.checked_expiry(req.expires_at, now)?;
        let password_hash = match req.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => Some(self.hasher.hash_password(password)?),
            None => None,
        };

        for _ in 0..self.config.max_token_attempts.max(1) {
            let share = ShareToken {
                token: self.generator.generate(),
                resource_id: req.resource_id,
                permission_level: req.permission_level,
                password_hash: password_hash.clone(),
                expires_at,
                issued_by: issuer.user_id,
                created_at: now,
                last_used_at: None,
            };
            match self.store.insert_share(share).await {
                Ok(share) => {
                    info!(
                        user_id = %issuer.user_id,
                        resource_id = %share.resource_id,
                        level = %share.permission_level,
                        protected = share.is_password_protected(),
                        "Share token issued"
                    );
                    return Ok(share);
                }
                Err(e) if e.is_conflict() => {
                    warn!("Share token collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::internal("Could not generate a unique share token"))
    }

    fn checked_expiry(
        &self,
        requested: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DateTime<Utc>>> {
        if let Some(at) = requested {
            if at <= now {
                return Err(AppError::validation("Expiry must be in the future"));
            }
        }
        let Some(hours) = self.config.max_lifetime_hours else {
            return Ok(requested);
        };
        let cap = now + Duration::hours(hours.min(MAX_LIFETIME_CAP_HOURS) as i64);
        match requested {
            None => Ok(Some(cap)),
            Some(at) if at > cap => Err(AppError::validation(format!(
                "Share tokens may live at most {hours} hours"
            ))),
            Some(at) => Ok(Some(at)),
        }
    }

    /// Validate a token and optional password.
    ///
    /// Checks run in order: unknown token (`NotFound`), expiry (`Expired`),
    /// password (`InvalidPassword`).
    pub async fn validate(&self, token: &str, password: Option<&str>) -> AppResult<ShareToken> {
        let mut share = self
            .store
            .find_share(token)
            .await?
            .ok_or_else(|| AppError::not_found("Share link not found"))?;

        let now = Utc::now();
        if share.is_expired_at(now) {
            return Err(AppError::expired("Share link has expired"));
        }

        if let Some(hash) = share.password_hash.as_deref() {
            let supplied = password.filter(|p| !p.is_empty()).ok_or_else(|| {
                AppError::invalid_password("This share link requires a password")
            })?;
            if !self.hasher.verify_password(supplied, hash)? {
                return Err(AppError::invalid_password("Invalid share password"));
            }
        }

        if self.config.track_last_used {
            match self.store.touch_share(token, now).await {
                Ok(()) => share.last_used_at = Some(now),
                Err(e) => warn!(error = %e, "Failed to record share token use"),
            }
        }

        Ok(share)
    }

    /// Revoke a token. Its issuer or an owner of the resource may revoke.
    pub async fn revoke(&self, principal: &Principal, token: &str) -> AppResult<()> {
        let share = self
            .store
            .find_share(token)
            .await?
            .ok_or_else(|| AppError::not_found("Share link not found"))?;

        if share.issued_by != principal.user_id {
            let effective = self
                .resolver
                .effective_permission(principal, share.resource_id)
                .await?;
            if effective.level.is_none() {
                return Err(AppError::not_found("Share link not found"));
            }
            if effective.level != PermissionLevel::Owner {
                return Err(AppError::authorization(
                    "Only the issuer or an owner may revoke this share",
                ));
            }
        }

        self.store.delete_share(token).await?;
        info!(
            user_id = %principal.user_id,
            resource_id = %share.resource_id,
            "Share token revoked"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_core::config::AccessConfig;
    use docvault_core::error::ErrorKind;
    use docvault_core::types::UserId;
    use docvault_database::{GrantRepository, MemoryStore, ResourceRepository, ShareTokenRepository};
    use docvault_entity::permission::{NewGrant, Subject};
    use docvault_entity::resource::{CreateResource, Resource};

    struct Fixture {
        store: Arc<MemoryStore>,
        shares: ShareTokenService,
        owner: Principal,
        file: Resource,
    }

    async fn fixture(config: ShareConfig) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let owner = UserId::new();
        let root = store
            .create_resource(CreateResource::root(owner))
            .await
            .expect("root");
        let file = store
            .create_resource(CreateResource::file(&root, "slides.pdf", None, None))
            .await
            .expect("file");
        let resolver = Arc::new(PermissionResolver::new(store.clone(), AccessConfig::default()));
        let shares = ShareTokenService::new(
            store.clone(),
            resolver,
            Arc::new(PasswordHasher::new()),
            config,
        );
        Fixture {
            store,
            shares,
            owner: Principal::user(owner),
            file,
        }
    }

    fn request(resource_id: ResourceId, level: PermissionLevel) -> IssueShare {
        IssueShare {
            resource_id,
            permission_level: level,
            password: None,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_issue_and_validate() {
        let f = fixture(ShareConfig::default()).await;
        let share = f
            .shares
            .issue(&f.owner, request(f.file.id, PermissionLevel::Viewer))
            .await
            .expect("issue");
        let validated = f.shares.validate(&share.token, None).await.expect("validate");
        assert_eq!(validated.resource_id, f.file.id);
        assert_eq!(validated.permission_level, PermissionLevel::Viewer);
        assert!(validated.last_used_at.is_some());
    }

    #[tokio::test]
    async fn test_issue_is_capped_by_issuer_level_and_share_flag() {
        let f = fixture(ShareConfig::default()).await;
        let editor = UserId::new();
        f.store
            .put_grant(
                NewGrant {
                    subject: Subject::User(editor),
                    resource_id: f.file.id,
                    permission_level: PermissionLevel::Editor,
                    inherit_from_parent: true,
                    can_share: false,
                }
                .into_grant(),
            )
            .await
            .expect("grant");
        let editor = Principal::user(editor);

        let err = f
            .shares
            .issue(&editor, request(f.file.id, PermissionLevel::Viewer))
            .await
            .expect_err("no share flag");
        assert_eq!(err.kind, ErrorKind::Authorization);

        f.store
            .put_grant(
                NewGrant {
                    subject: Subject::User(editor.user_id),
                    resource_id: f.file.id,
                    permission_level: PermissionLevel::Editor,
                    inherit_from_parent: true,
                    can_share: true,
                }
                .into_grant(),
            )
            .await
            .expect("grant");
        let err = f
            .shares
            .issue(&editor, request(f.file.id, PermissionLevel::Owner))
            .await
            .expect_err("above own level");
        assert_eq!(err.kind, ErrorKind::Authorization);
        assert!(
            f.shares
                .issue(&editor, request(f.file.id, PermissionLevel::Editor))
                .await
                .is_ok()
        );

        let stranger = Principal::user(UserId::new());
        let err = f
            .shares
            .issue(&stranger, request(f.file.id, PermissionLevel::Viewer))
            .await
            .expect_err("hidden");
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_password_protection() {
        let f = fixture(ShareConfig::default()).await;
        let mut req = request(f.file.id, PermissionLevel::Viewer);
        req.password = Some("s3cret".to_string());
        let share = f.shares.issue(&f.owner, req).await.expect("issue");

        let missing = f.shares.validate(&share.token, None).await.expect_err("missing");
        assert_eq!(missing.kind, ErrorKind::InvalidPassword);
        let wrong = f.shares.validate(&share.token, Some("nope")).await.expect_err("wrong");
        assert_eq!(wrong.kind, ErrorKind::InvalidPassword);
        assert!(f.shares.validate(&share.token, Some("s3cret")).await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_password_means_unprotected() {
        let f = fixture(ShareConfig::default()).await;
        let mut req = request(f.file.id, PermissionLevel::Viewer);
        req.password = Some(String::new());
        let share = f.shares.issue(&f.owner, req).await.expect("issue");
        assert!(!share.is_password_protected());
    }

    #[tokio::test]
    async fn test_expired_token_fails_even_unrevoked() {
        let f = fixture(ShareConfig::default()).await;
        let share = ShareToken {
            token: "stale-token".to_string(),
            resource_id: f.file.id,
            permission_level: PermissionLevel::Viewer,
            password_hash: None,
            expires_at: Some(Utc::now() - Duration::minutes(5)),
            issued_by: f.owner.user_id,
            created_at: Utc::now() - Duration::hours(1),
            last_used_at: None,
        };
        f.store.insert_share(share).await.expect("insert");

        let err = f.shares.validate("stale-token", None).await.expect_err("expired");
        assert_eq!(err.kind, ErrorKind::Expired);
        let err = f.shares.validate("unknown", None).await.expect_err("unknown");
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_expiry_rules() {
        let f = fixture(ShareConfig {
            max_lifetime_hours: Some(24),
            ..ShareConfig::default()
        })
        .await;

        let mut past = request(f.file.id, PermissionLevel::Viewer);
        past.expires_at = Some(Utc::now() - Duration::seconds(1));
        assert_eq!(
            f.shares.issue(&f.owner, past).await.expect_err("past").kind,
            ErrorKind::Validation
        );

        let mut far = request(f.file.id, PermissionLevel::Viewer);
        far.expires_at = Some(Utc::now() + Duration::days(30));
        assert_eq!(
            f.shares.issue(&f.owner, far).await.expect_err("too far").kind,
            ErrorKind::Validation
        );

        let capped = f
            .shares
            .issue(&f.owner, request(f.file.id, PermissionLevel::Viewer))
            .await
            .expect("capped");
        assert!(capped.expires_at.is_some());
    }

    #[tokio::test]
    async fn test_revoke() {
        let f = fixture(ShareConfig::default()).await;
        let share = f
            .shares
            .issue(&f.owner, request(f.file.id, PermissionLevel::Viewer))
            .await
            .expect("issue");

        let stranger = Principal::user(UserId::new());
        assert_eq!(
            f.shares.revoke(&stranger, &share.token).await.expect_err("stranger").kind,
            ErrorKind::NotFound
        );

        f.shares.revoke(&f.owner, &share.token).await.expect("revoke");
        assert_eq!(
            f.shares.validate(&share.token, None).await.expect_err("revoked").kind,
            ErrorKind::NotFound
        );
    }
}
