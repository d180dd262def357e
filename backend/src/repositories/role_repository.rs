//! Database repository for role operations.
//!
//! Provides read-only access to system roles with:
//! - Role lookup by name
//! - Role membership checks (the `RoleChecker` used by the API)
use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::auth::collaborators::RoleChecker;
use crate::database::models::Role;
use crate::errors::ServiceResult;

/// Repository for role database operations.
#[derive(Clone)]
pub struct RoleRepository {
    /// Shared SQLite connection pool
    pool: SqlitePool,
}

impl RoleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Retrieves a role by its exact name.
    ///
    /// # Returns
    /// `Some(Role)` if found and not deleted, `None` otherwise
    pub async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, is_active FROM roles WHERE name = ? AND is_deleted = 0",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    /// Checks whether a user holds an active role with the given name.
    pub async fn user_has_role(&self, user_id: &str, role_name: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM user_roles ur
            JOIN roles r ON ur.role_id = r.id
            WHERE ur.user_id = ? AND r.name = ? AND r.is_active = 1 AND r.is_deleted = 0
            "#,
        )
        .bind(user_id)
        .bind(role_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }
}

#[async_trait]
impl RoleChecker for RoleRepository {
    async fn has_role(&self, user_id: &str, role: &str) -> ServiceResult<bool> {
        Ok(self.user_has_role(user_id, role).await?)
    }
}
