//! Share token repository on PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use docvault_core::result::AppResult;
use docvault_core::types::ResourceId;
use docvault_entity::share::ShareToken;

use super::{PgStore, db_error};
use crate::store::ShareTokenRepository;

#[async_trait]
impl ShareTokenRepository for PgStore {
    async fn insert_share(&self, share: ShareToken) -> AppResult<ShareToken> {
        sqlx::query_as::<_, ShareToken>(
            "INSERT INTO share_tokens (token, resource_id, permission_level, password_hash, \
             expires_at, issued_by, created_at, last_used_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(&share.token)
        .bind(share.resource_id)
        .bind(share.permission_level)
        .bind(&share.password_hash)
        .bind(share.expires_at)
        .bind(share.issued_by)
        .bind(share.created_at)
        .bind(share.last_used_at)
        .fetch_one(self.pool())
        .await
        .map_err(db_error("Failed to insert share token"))
    }

    async fn find_share(&self, token: &str) -> AppResult<Option<ShareToken>> {
        sqlx::query_as::<_, ShareToken>("SELECT * FROM share_tokens WHERE token = $1")
            .bind(token)
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find share token"))
    }

    async fn delete_share(&self, token: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM share_tokens WHERE token = $1")
            .bind(token)
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to delete share token"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn touch_share(&self, token: &str, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE share_tokens SET last_used_at = $2 WHERE token = $1")
            .bind(token)
            .bind(at)
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to touch share token"))?;
        Ok(())
    }

    async fn shares_for_resource(&self, resource_id: ResourceId) -> AppResult<Vec<ShareToken>> {
        sqlx::query_as::<_, ShareToken>(
            "SELECT * FROM share_tokens WHERE resource_id = $1 ORDER BY created_at ASC",
        )
        .bind(resource_id)
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list share tokens"))
    }
}
