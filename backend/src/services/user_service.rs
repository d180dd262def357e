//! User business logic service.
//!
//! Handles user creation, password hashing and the admin bootstrap run at
//! startup.

use crate::auth::models::Password;
use crate::config::AdminBootstrap;
use crate::database::models::{CreateNewUser, CreateUser, User};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::role_repository::RoleRepository;
use crate::repositories::user_repository::UserRepository;
use bcrypt::{DEFAULT_COST, hash, verify};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct UserService {
    users: UserRepository,
    roles: RoleRepository,
    hash_cost: u32,
}

impl UserService {
    /// Creates a new UserService instance.
    ///
    /// # Arguments
    /// * `pool` - SQLite connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            roles: RoleRepository::new(pool),
            hash_cost: DEFAULT_COST,
        }
    }

    /// Overrides the bcrypt cost factor.
    #[cfg(test)]
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Creates a new user with full validation.
    ///
    /// # Returns
    /// The newly created User with all fields populated
    ///
    /// # Errors
    /// Returns `ServiceError` for:
    /// - Validation failures
    /// - Duplicate username or email
    /// - Unknown role names
    pub async fn create_user(&self, create_user: CreateNewUser) -> ServiceResult<User> {
        // Input validation using validator crate
        if let Err(validation_errors) = create_user.validate() {
            let error_messages: Vec<String> = validation_errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, errors)| {
                    errors.iter().map(move |error| {
                        format!(
                            "{}: {}",
                            field,
                            error.message.as_ref().unwrap_or(&"Invalid value".into())
                        )
                    })
                })
                .collect();

            return Err(ServiceError::validation(error_messages.join(", ")));
        }

        if create_user.username.contains('@') {
            return Err(ServiceError::validation(
                "username: Username must not contain '@'",
            ));
        }

        if self.users.username_exists(&create_user.username).await? {
            return Err(ServiceError::already_exists("User", &create_user.username));
        }

        if self.users.email_exists(&create_user.email).await? {
            return Err(ServiceError::already_exists("User", &create_user.email));
        }

        let mut role_ids = Vec::with_capacity(create_user.roles.len());
        for role_name in &create_user.roles {
            let role = self
                .roles
                .get_role_by_name(role_name)
                .await?
                .ok_or_else(|| ServiceError::not_found("Role", role_name))?;
            role_ids.push(role.id);
        }

        let password = Password::Plain(create_user.password);
        let password_hash = Self::hash_password(&password, self.hash_cost)?;

        let user = self
            .users
            .create_user(CreateUser {
                id: Uuid::now_v7().to_string(),
                username: create_user.username,
                name: create_user.name,
                email: create_user.email,
                email_verified: create_user.email_verified,
                password_hash,
            })
            .await?;

        for role_id in role_ids {
            self.users.assign_role(&user.id, &role_id).await?;
        }

        Ok(user)
    }

    /// Creates the configured admin user unless a user with that username
    /// already exists.
    ///
    /// # Returns
    /// `true` if a user was created
    pub async fn ensure_admin_user(&self, admin: &AdminBootstrap) -> ServiceResult<bool> {
        if self.users.username_exists(&admin.username).await? {
            return Ok(false);
        }

        let user = self
            .create_user(CreateNewUser {
                username: admin.username.clone(),
                name: admin.username.clone(),
                email: admin.email.clone(),
                password: admin.password.clone(),
                roles: vec!["admin".to_string(), "user".to_string()],
                email_verified: true,
            })
            .await?;

        info!("Created admin user {}", user.username);
        Ok(true)
    }

    /// Hashes a password for storage.
    ///
    /// The bcrypt hash is computed over the SHA-256 digest, so either form of
    /// the password verifies against it.
    pub fn hash_password(password: &Password, cost: u32) -> ServiceResult<String> {
        hash(password.digest(), cost)
            .map_err(|e| ServiceError::internal_error(format!("Password hashing failed: {}", e)))
    }

    /// Verifies a password against the stored hash
    ///
    /// # Returns
    /// `true` if password matches hash, `false` otherwise
    pub fn verify_password(password: &Password, password_hash: &str) -> ServiceResult<bool> {
        verify(password.digest(), password_hash).map_err(|e| {
            ServiceError::internal_error(format!("Password verification failed: {}", e))
        })
    }
}
