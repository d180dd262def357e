//! Password and session-token authentication against the user table.
//!
//! `PasswordAuthenticator` is the `Authenticator` used by the running
//! server. It classifies failures itself: an identity that does not exist is
//! reported as `AuthFailure::UnknownUser`, anything else as a rejection with
//! a code and a message.

use crate::auth::collaborators::Authenticator;
use crate::auth::errors::AuthFailure;
use crate::auth::invocation::IsolatedInvocation;
use crate::auth::models::{AuthResult, Credentials, Password, UserSelector};
use crate::database::models::User;
use crate::repositories::user_repository::UserRepository;
use crate::services::user_service::UserService;
use crate::utils::jwt::JwtUtils;
use async_trait::async_trait;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, error};

const FORBIDDEN: &str = "403";

pub struct PasswordAuthenticator {
    users: UserRepository,
    jwt: Arc<JwtUtils>,
}

impl PasswordAuthenticator {
    pub fn new(users: UserRepository, jwt: Arc<JwtUtils>) -> Self {
        Self { users, jwt }
    }

    async fn login_with_password(
        &self,
        invocation: &IsolatedInvocation,
        selector: UserSelector,
        password: Password,
    ) -> Result<AuthResult, AuthFailure> {
        let lookup = match &selector {
            UserSelector::Username(username) => self.users.get_user_by_username(username).await,
            UserSelector::Email(email) => self.users.get_user_by_email(email).await,
        };
        let user = lookup
            .map_err(|e| internal(invocation, e))?
            .ok_or(AuthFailure::UnknownUser)?;

        let password_hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || {
            UserService::verify_password(&password, &password_hash)
        })
        .await
        .map_err(|e| internal(invocation, e))?
        .map_err(|e| internal(invocation, e))?;

        if !matches {
            return Err(AuthFailure::rejected(FORBIDDEN, "Incorrect password"));
        }

        self.issue(invocation, &user)
    }

    async fn resume(
        &self,
        invocation: &IsolatedInvocation,
        token: String,
    ) -> Result<AuthResult, AuthFailure> {
        let claims = match self.jwt.validate_token(&token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(invocation = %invocation.id(), "Resume token refused: {}", e);
                invocation.connection().close();
                return Err(AuthFailure::rejected(
                    FORBIDDEN,
                    "You've been logged out by the server. Please log in again.",
                ));
            }
        };

        let user = self
            .users
            .get_user_by_id(claims.user_id())
            .await
            .map_err(|e| internal(invocation, e))?
            .ok_or(AuthFailure::UnknownUser)?;
        ensure_active(&user)?;

        Ok(AuthResult {
            user_id: user.id,
            token,
        })
    }

    fn issue(&self, invocation: &IsolatedInvocation, user: &User) -> Result<AuthResult, AuthFailure> {
        ensure_active(user)?;

        let token = self
            .jwt
            .generate_token(&user.id, &user.username)
            .map_err(|e| internal(invocation, e))?;

        Ok(AuthResult {
            user_id: user.id.clone(),
            token,
        })
    }
}

fn ensure_active(user: &User) -> Result<(), AuthFailure> {
    if user.is_active {
        Ok(())
    } else {
        Err(AuthFailure::rejected(FORBIDDEN, "User is not active"))
    }
}

fn internal(invocation: &IsolatedInvocation, error: impl Display) -> AuthFailure {
    error!(invocation = %invocation.id(), "Authentication error: {}", error);
    AuthFailure::rejected("500", "Internal server error")
}

#[async_trait]
impl Authenticator for PasswordAuthenticator {
    async fn authenticate(
        &self,
        invocation: &IsolatedInvocation,
        credentials: Credentials,
    ) -> Result<AuthResult, AuthFailure> {
        match credentials {
            Credentials::Password { user, password } => {
                self.login_with_password(invocation, user, password).await
            }
            Credentials::Resume { token } => self.resume(invocation, token).await,
        }
    }
}
