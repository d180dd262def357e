//! Interfaces the login flow depends on but does not implement.
//!
//! Concrete implementations live in `repositories` and `services`; tests
//! substitute in-memory doubles.

use crate::auth::errors::AuthFailure;
use crate::auth::invocation::IsolatedInvocation;
use crate::auth::models::{AuthResult, Credentials, LoginContext, UserFields, UserRecord};
use crate::errors::ServiceResult;
use async_trait::async_trait;
use serde_json::Value;

/// Verifies credentials and issues a session token.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(
        &self,
        invocation: &IsolatedInvocation,
        credentials: Credentials,
    ) -> Result<AuthResult, AuthFailure>;
}

/// Read access to user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Returns the projection of the user limited to `fields`, or `None` if
    /// no such user exists.
    async fn fetch_user(&self, user_id: &str, fields: &UserFields)
    -> ServiceResult<Option<UserRecord>>;
}

/// Builds the `me` object returned to a freshly logged-in client.
pub trait UserInfoProvider: Send + Sync {
    fn derive_user_info(&self, user: &UserRecord) -> Value;
}

#[async_trait]
pub trait RoleChecker: Send + Sync {
    async fn has_role(&self, user_id: &str, role: &str) -> ServiceResult<bool>;
}

/// Optional extension invoked after every successful login.
///
/// A `Some` value is attached to the response as `data.extra`.
#[async_trait]
pub trait LoginHook: Send + Sync {
    async fn on_logged_in(&self, context: &LoginContext<'_>) -> Option<Value>;
}
