//! Resource repository on PostgreSQL.

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::{ResourceId, UserId};
use docvault_entity::permission::Grant;
use docvault_entity::resource::{CreateResource, Resource, ResourceTree, join_path};

use super::{PgStore, db_error};
use crate::store::{DeleteSummary, ResourceRepository};

const RESOURCE_COLUMNS: &str = "id, owner_id, resource_type, name, path, parent_id, mime_type, \
     size_bytes, created_at, updated_at";

#[async_trait]
impl ResourceRepository for PgStore {
    async fn find_resource(&self, id: ResourceId) -> AppResult<Option<Resource>> {
        sqlx::query_as::<_, Resource>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(db_error("Failed to find resource"))
    }

    async fn find_by_path(&self, owner_id: UserId, path: &str) -> AppResult<Option<Resource>> {
        sqlx::query_as::<_, Resource>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE owner_id = $1 AND path = $2"
        ))
        .bind(owner_id)
        .bind(path)
        .fetch_optional(self.pool())
        .await
        .map_err(db_error("Failed to find resource by path"))
    }

    async fn find_child(&self, parent_id: ResourceId, name: &str) -> AppResult<Option<Resource>> {
        sqlx::query_as::<_, Resource>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE parent_id = $1 AND name = $2"
        ))
        .bind(parent_id)
        .bind(name)
        .fetch_optional(self.pool())
        .await
        .map_err(db_error("Failed to find child resource"))
    }

    async fn list_children(&self, parent_id: ResourceId) -> AppResult<Vec<Resource>> {
        sqlx::query_as::<_, Resource>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE parent_id = $1 ORDER BY name ASC"
        ))
        .bind(parent_id)
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list children"))
    }

    async fn load_ancestry(&self, id: ResourceId, max_depth: usize) -> AppResult<ResourceTree> {
        let depth = i32::try_from(max_depth).unwrap_or(i32::MAX);
        let rows = sqlx::query_as::<_, Resource>(&format!(
            "WITH RECURSIVE chain AS ( \
                SELECT {RESOURCE_COLUMNS}, 0 AS depth FROM resources WHERE id = $1 \
                UNION ALL \
                SELECT p.id, p.owner_id, p.resource_type, p.name, p.path, p.parent_id, \
                       p.mime_type, p.size_bytes, p.created_at, p.updated_at, c.depth + 1 \
                FROM resources p INNER JOIN chain c ON p.id = c.parent_id \
                WHERE c.depth < $2 \
             ) \
             SELECT {RESOURCE_COLUMNS} FROM chain ORDER BY depth ASC"
        ))
        .bind(id)
        .bind(depth)
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to load ancestor chain"))?;

        debug!(resource_id = %id, rows = rows.len(), "Loaded ancestor chain");
        Ok(ResourceTree::from_rows(rows))
    }

    async fn create_resource(&self, input: CreateResource) -> AppResult<Resource> {
        let resource = input.into_resource();
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let created = sqlx::query_as::<_, Resource>(&format!(
            "INSERT INTO resources ({RESOURCE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {RESOURCE_COLUMNS}"
        ))
        .bind(resource.id)
        .bind(resource.owner_id)
        .bind(resource.resource_type)
        .bind(&resource.name)
        .bind(&resource.path)
        .bind(resource.parent_id)
        .bind(&resource.mime_type)
        .bind(resource.size_bytes)
        .bind(resource.created_at)
        .bind(resource.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to create resource"))?;

        let owner = Grant::owner(created.id, created.owner_id);
        sqlx::query(
            "INSERT INTO grants (id, subject_kind, subject_id, resource_id, permission_level, \
             inherit_from_parent, can_share, is_owner, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(owner.id)
        .bind(owner.subject_kind)
        .bind(owner.subject_id)
        .bind(owner.resource_id)
        .bind(owner.permission_level)
        .bind(owner.inherit_from_parent)
        .bind(owner.can_share)
        .bind(owner.is_owner)
        .bind(owner.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to create owner grant"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit resource creation"))?;
        Ok(created)
    }

    async fn rename_resource(&self, id: ResourceId, new_name: &str) -> AppResult<Resource> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let node = sqlx::query_as::<_, Resource>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to lock resource"))?
        .ok_or_else(|| AppError::not_found("Resource not found"))?;

        let parent_id = node
            .parent_id
            .ok_or_else(|| AppError::validation("The root folder cannot be renamed"))?;
        let parent_path: String = sqlx::query_scalar("SELECT path FROM resources WHERE id = $1")
            .bind(parent_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("Failed to load parent folder"))?;

        let new_path = join_path(&parent_path, new_name);
        let renamed = sqlx::query_as::<_, Resource>(&format!(
            "UPDATE resources SET name = $2, path = $3, updated_at = $4 \
             WHERE id = $1 RETURNING {RESOURCE_COLUMNS}"
        ))
        .bind(id)
        .bind(new_name)
        .bind(&new_path)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to rename resource"))?;

        let tail_start = i32::try_from(node.path.chars().count() + 1).unwrap_or(i32::MAX);
        sqlx::query(
            "UPDATE resources SET path = $2 || substring(path FROM $3) \
             WHERE owner_id = $1 AND starts_with(path, $4)",
        )
        .bind(node.owner_id)
        .bind(&new_path)
        .bind(tail_start)
        .bind(format!("{}/", node.path))
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to rewrite descendant paths"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit rename"))?;
        Ok(renamed)
    }

    async fn delete_subtree(&self, id: ResourceId) -> AppResult<DeleteSummary> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let ids: Vec<ResourceId> = sqlx::query_scalar(
            "WITH RECURSIVE subtree AS ( \
                SELECT id FROM resources WHERE id = $1 \
                UNION \
                SELECT r.id FROM resources r INNER JOIN subtree s ON r.parent_id = s.id \
             ) \
             SELECT id FROM subtree",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("Failed to collect subtree"))?;

        if ids.is_empty() {
            return Err(AppError::not_found("Resource not found"));
        }

        let share_tokens = sqlx::query("DELETE FROM share_tokens WHERE resource_id = ANY($1)")
            .bind(&ids)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to delete share tokens"))?
            .rows_affected();
        let grants = sqlx::query("DELETE FROM grants WHERE resource_id = ANY($1)")
            .bind(&ids)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to delete grants"))?
            .rows_affected();
        let resources = sqlx::query("DELETE FROM resources WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to delete resources"))?
            .rows_affected();

        tx.commit()
            .await
            .map_err(db_error("Failed to commit cascade delete"))?;

        Ok(DeleteSummary {
            resources,
            grants,
            share_tokens,
        })
    }
}
