//! Group and role repository on PostgreSQL.

use async_trait::async_trait;

use docvault_core::result::AppResult;
use docvault_core::types::{GroupId, RoleId, UserId};
use docvault_entity::directory::{Capability, Group, GroupMembership, Role, RoleAssignment};

use super::{PgStore, db_error};
use crate::store::DirectoryRepository;

#[async_trait]
impl DirectoryRepository for PgStore {
    async fn create_group(&self, group: Group, admin: UserId) -> AppResult<Group> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let created = sqlx::query_as::<_, Group>(
            "INSERT INTO user_groups (id, name, created_at) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(group.id)
        .bind(&group.name)
        .bind(group.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to create group"))?;

        sqlx::query(
            "INSERT INTO group_memberships (group_id, user_id, is_group_admin) \
             VALUES ($1, $2, TRUE)",
        )
        .bind(created.id)
        .bind(admin)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to add group admin"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit group creation"))?;
        Ok(created)
    }

    async fn find_group(&self, id: GroupId) -> AppResult<Option<Group>> {
        sqlx::query_as::<_, Group>("SELECT * FROM user_groups WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find group"))
    }

    async fn put_membership(&self, membership: GroupMembership) -> AppResult<GroupMembership> {
        sqlx::query_as::<_, GroupMembership>(
            "INSERT INTO group_memberships (group_id, user_id, is_group_admin) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (group_id, user_id) DO UPDATE SET is_group_admin = EXCLUDED.is_group_admin \
             RETURNING *",
        )
        .bind(membership.group_id)
        .bind(membership.user_id)
        .bind(membership.is_group_admin)
        .fetch_one(self.pool())
        .await
        .map_err(db_error("Failed to put group membership"))
    }

    async fn delete_membership(&self, group_id: GroupId, user_id: UserId) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM group_memberships WHERE group_id = $1 AND user_id = $2")
                .bind(group_id)
                .bind(user_id)
                .execute(self.pool())
                .await
                .map_err(db_error("Failed to delete group membership"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_membership(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> AppResult<Option<GroupMembership>> {
        sqlx::query_as::<_, GroupMembership>(
            "SELECT * FROM group_memberships WHERE group_id = $1 AND user_id = $2",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(db_error("Failed to find group membership"))
    }

    async fn list_members(&self, group_id: GroupId) -> AppResult<Vec<GroupMembership>> {
        sqlx::query_as::<_, GroupMembership>(
            "SELECT * FROM group_memberships WHERE group_id = $1 ORDER BY user_id ASC",
        )
        .bind(group_id)
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list group members"))
    }

    async fn groups_for_user(&self, user_id: UserId) -> AppResult<Vec<GroupId>> {
        sqlx::query_scalar::<_, GroupId>(
            "SELECT group_id FROM group_memberships WHERE user_id = $1 ORDER BY group_id ASC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list user groups"))
    }

    async fn create_role(&self, role: Role, capabilities: &[Capability]) -> AppResult<Role> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let created = sqlx::query_as::<_, Role>(
            "INSERT INTO roles (id, name, description, created_at) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(role.id)
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to create role"))?;

        for capability in capabilities {
            sqlx::query(
                "INSERT INTO role_permissions (role_id, capability) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(created.id)
            .bind(*capability)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to attach role capability"))?;
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit role creation"))?;
        Ok(created)
    }

    async fn find_role(&self, id: RoleId) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find role"))
    }

    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find role by name"))
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY name ASC")
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to list roles"))
    }

    async fn assign_role(&self, assignment: RoleAssignment) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO role_assignments (user_id, role_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(assignment.user_id)
        .bind(assignment.role_id)
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to assign role"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn roles_for_user(&self, user_id: UserId) -> AppResult<Vec<Role>> {
        sqlx::query_as::<_, Role>(
            "SELECT r.* FROM roles r \
             INNER JOIN role_assignments a ON a.role_id = r.id \
             WHERE a.user_id = $1 ORDER BY r.name ASC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list user roles"))
    }

    async fn capabilities_for_roles(&self, role_ids: &[RoleId]) -> AppResult<Vec<Capability>> {
        sqlx::query_scalar::<_, Capability>(
            "SELECT DISTINCT capability FROM role_permissions WHERE role_id = ANY($1) \
             ORDER BY capability ASC",
        )
        .bind(role_ids)
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list role capabilities"))
    }
}
