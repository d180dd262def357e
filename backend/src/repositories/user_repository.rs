//! Database repository for user operations.
//!
//! Provides user creation and lookups, and serves as the `UserStore` used by
//! the login flow.

use crate::auth::collaborators::UserStore;
use crate::auth::models::{UserFields, UserRecord};
use crate::database::models::{CreateUser, User};
use crate::errors::ServiceResult;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use sqlx::SqlitePool;

const USER_COLUMNS: &str = r#"
    id, username, name, email, email_verified, password_hash, status, status_text,
    utc_offset, language, is_active, created_at
"#;

/// Repository for user database operations.
#[derive(Clone)]
pub struct UserRepository {
    /// Shared SQLite connection pool
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository instance.
    ///
    /// # Arguments
    /// * `pool` - SQLite connection pool (cheap to clone)
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new user in the database.
    ///
    /// # Returns
    /// The newly created User with all fields populated
    pub async fn create_user(&self, user: CreateUser) -> Result<User> {
        let now = Utc::now();
        let query = format!(
            r#"
            INSERT INTO users (id, username, name, email, email_verified, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(user.username)
            .bind(user.name)
            .bind(user.email)
            .bind(user.email_verified)
            .bind(user.password_hash)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    /// Retrieves a user by their unique identifier.
    ///
    /// # Returns
    /// `Some(User)` if found and not deleted, `None` otherwise
    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ? AND is_deleted = 0");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Retrieves a user by their username.
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let query =
            format!("SELECT {USER_COLUMNS} FROM users WHERE username = ? AND is_deleted = 0");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Retrieves a user by their email. Matching is case-insensitive.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE AND is_deleted = 0"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Checks if a username already exists in the system.
    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE username = ? AND is_deleted = 0",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Checks if an email already exists in the system.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE email = ? COLLATE NOCASE AND is_deleted = 0",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Names of the roles granted to a user, sorted.
    pub async fn get_user_role_names(&self, user_id: &str) -> Result<Vec<String>> {
        let roles: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT r.name
            FROM user_roles ur
            JOIN roles r ON ur.role_id = r.id
            WHERE ur.user_id = ? AND r.is_deleted = 0
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    /// Grants a role to a user. Granting an already held role is a no-op.
    pub async fn assign_role(&self, user_id: &str, role_id: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Builds the allow-listed projection of a user row.
fn project_user(user: &User, roles: Vec<String>, fields: &UserFields) -> UserRecord {
    let mut record = UserRecord::new(user.id.clone());
    record.project(fields, "name", user.name.clone());
    record.project(fields, "username", user.username.clone());
    record.project(
        fields,
        "emails",
        json!([{ "address": user.email, "verified": user.email_verified }]),
    );
    record.project(fields, "status", user.status.clone());
    if let Some(status_text) = &user.status_text {
        record.project(fields, "statusText", status_text.clone());
    }
    record.project(fields, "utcOffset", user.utc_offset);
    if let Some(language) = &user.language {
        record.project(fields, "language", language.clone());
    }
    record.project(fields, "active", user.is_active);
    record.project(fields, "roles", roles);
    record.project(
        fields,
        "createdAt",
        user.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    );
    record
}

#[async_trait]
impl UserStore for UserRepository {
    async fn fetch_user(
        &self,
        user_id: &str,
        fields: &UserFields,
    ) -> ServiceResult<Option<UserRecord>> {
        let Some(user) = self.get_user_by_id(user_id).await? else {
            return Ok(None);
        };

        let roles = if fields.includes("roles") {
            self.get_user_role_names(user_id).await?
        } else {
            Vec::new()
        };

        Ok(Some(project_user(&user, roles, fields)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;

    fn new_user(id: &str, username: &str, email: &str) -> CreateUser {
        CreateUser {
            id: id.to_string(),
            username: username.to_string(),
            name: format!("{username} Example"),
            email: email.to_string(),
            email_verified: true,
            password_hash: "$2b$04$not-a-real-hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup_user() {
        let repo = UserRepository::new(test_pool().await);
        let created = repo
            .create_user(new_user("u1", "alice", "alice@x.com"))
            .await
            .unwrap();
        assert_eq!(created.username, "alice");
        assert!(created.is_active);

        assert!(repo.get_user_by_id("u1").await.unwrap().is_some());
        assert!(repo.get_user_by_username("alice").await.unwrap().is_some());
        assert!(repo.get_user_by_email("ALICE@x.com").await.unwrap().is_some());
        assert!(repo.get_user_by_username("bob").await.unwrap().is_none());

        assert!(repo.username_exists("alice").await.unwrap());
        assert!(repo.email_exists("Alice@X.com").await.unwrap());
        assert!(!repo.email_exists("bob@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_roles_are_listed_once() {
        let repo = UserRepository::new(test_pool().await);
        repo.create_user(new_user("u1", "alice", "alice@x.com"))
            .await
            .unwrap();

        repo.assign_role("u1", "role-user").await.unwrap();
        repo.assign_role("u1", "role-admin").await.unwrap();
        repo.assign_role("u1", "role-admin").await.unwrap();

        assert_eq!(
            repo.get_user_role_names("u1").await.unwrap(),
            vec!["admin".to_string(), "user".to_string()]
        );
    }

    #[tokio::test]
    async fn test_fetch_user_projects_allowed_fields_only() {
        let repo = UserRepository::new(test_pool().await);
        repo.create_user(new_user("u1", "alice", "alice@x.com"))
            .await
            .unwrap();
        repo.assign_role("u1", "role-user").await.unwrap();

        let record = repo
            .fetch_user("u1", &UserFields::default_fields())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.id, "u1");
        assert_eq!(record.username(), Some("alice"));
        assert_eq!(record.verified_email(), Some("alice@x.com"));
        assert_eq!(record.get("roles"), Some(&json!(["user"])));
        let serialized = serde_json::to_string(&record).unwrap();
        assert!(!serialized.contains("password"));
        assert!(!serialized.contains("$2b$"));

        let narrow = repo
            .fetch_user("u1", &UserFields::only(&["username"]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            serde_json::to_value(&narrow).unwrap(),
            json!({"_id": "u1", "username": "alice"})
        );

        assert!(
            repo.fetch_user("missing", &UserFields::default_fields())
                .await
                .unwrap()
                .is_none()
        );
    }
}
