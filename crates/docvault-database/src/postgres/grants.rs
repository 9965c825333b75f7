//! Grant repository on PostgreSQL.

use async_trait::async_trait;
use uuid::Uuid;

use docvault_core::result::AppResult;
use docvault_core::types::ResourceId;
use docvault_entity::permission::{Grant, SubjectKind};

use super::{PgStore, db_error};
use crate::store::GrantRepository;

#[async_trait]
impl GrantRepository for PgStore {
    async fn put_grant(&self, grant: Grant) -> AppResult<Grant> {
        sqlx::query_as::<_, Grant>(
            "INSERT INTO grants (id, subject_kind, subject_id, resource_id, permission_level, \
             inherit_from_parent, can_share, is_owner, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (subject_kind, subject_id, resource_id) DO UPDATE SET \
             permission_level = EXCLUDED.permission_level, \
             inherit_from_parent = EXCLUDED.inherit_from_parent, \
             can_share = EXCLUDED.can_share \
             RETURNING *",
        )
        .bind(grant.id)
        .bind(grant.subject_kind)
        .bind(grant.subject_id)
        .bind(grant.resource_id)
        .bind(grant.permission_level)
        .bind(grant.inherit_from_parent)
        .bind(grant.can_share)
        .bind(grant.is_owner)
        .bind(grant.created_at)
        .fetch_one(self.pool())
        .await
        .map_err(db_error("Failed to put grant"))
    }

    async fn delete_grant(
        &self,
        subject_kind: SubjectKind,
        subject_id: Uuid,
        resource_id: ResourceId,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM grants WHERE subject_kind = $1 AND subject_id = $2 AND resource_id = $3",
        )
        .bind(subject_kind)
        .bind(subject_id)
        .bind(resource_id)
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to delete grant"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn grants_for_resource(&self, resource_id: ResourceId) -> AppResult<Vec<Grant>> {
        sqlx::query_as::<_, Grant>(
            "SELECT * FROM grants WHERE resource_id = $1 ORDER BY created_at ASC",
        )
        .bind(resource_id)
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list grants for resource"))
    }

    async fn grants_for_resources(&self, resource_ids: &[ResourceId]) -> AppResult<Vec<Grant>> {
        sqlx::query_as::<_, Grant>(
            "SELECT * FROM grants WHERE resource_id = ANY($1) ORDER BY created_at ASC",
        )
        .bind(resource_ids)
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list grants for resources"))
    }

    async fn grants_for_subject(
        &self,
        subject_kind: SubjectKind,
        subject_id: Uuid,
    ) -> AppResult<Vec<Grant>> {
        sqlx::query_as::<_, Grant>(
            "SELECT * FROM grants WHERE subject_kind = $1 AND subject_id = $2 \
             ORDER BY created_at ASC",
        )
        .bind(subject_kind)
        .bind(subject_id)
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list grants for subject"))
    }
}
