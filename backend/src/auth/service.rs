//! Core logic of the login-compatibility endpoint.
//!
//! `LoginCompatService` accepts a legacy login body, authenticates it
//! through an `Authenticator` inside an isolated invocation, and shapes the
//! result into the legacy envelope. It keeps no state between requests.

use crate::auth::collaborators::{Authenticator, LoginHook, UserInfoProvider, UserStore};
use crate::auth::compat;
use crate::auth::errors::LoginError;
use crate::auth::invocation::IsolatedInvocation;
use crate::auth::models::{
    LoginBody, LoginContext, LoginData, LoginEnvelope, LoginSuccess, RequestContext, UserFields,
};
use crate::errors::ServiceError;
use axum::http::StatusCode;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct LoginCompatService {
    authenticator: Arc<dyn Authenticator>,
    user_store: Arc<dyn UserStore>,
    user_info: Arc<dyn UserInfoProvider>,
    on_logged_in: Option<Arc<dyn LoginHook>>,
}

impl LoginCompatService {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        user_store: Arc<dyn UserStore>,
        user_info: Arc<dyn UserInfoProvider>,
    ) -> Self {
        Self {
            authenticator,
            user_store,
            user_info,
            on_logged_in: None,
        }
    }

    /// Installs the post-login hook.
    pub fn with_login_hook(mut self, hook: Arc<dyn LoginHook>) -> Self {
        self.on_logged_in = Some(hook);
        self
    }

    /// Handles one login request. Every outcome, including failures, is
    /// returned as a status code and envelope.
    pub async fn handle(&self, request: RequestContext) -> (StatusCode, LoginEnvelope) {
        match self.login(&request).await {
            Ok(success) => (StatusCode::OK, LoginEnvelope::Success(success)),
            Err(error) => (error.status_code(), LoginEnvelope::Error(error.into_body())),
        }
    }

    async fn login(&self, request: &RequestContext) -> Result<LoginSuccess, LoginError> {
        let body = LoginBody::from_value(&request.body)?;
        let credentials = compat::normalize(&body)?;

        let invocation = IsolatedInvocation::new();
        let auth = self
            .authenticator
            .authenticate(&invocation, credentials)
            .await
            .map_err(|failure| {
                warn!(invocation = %invocation.id(), "Login rejected: {}", failure);
                LoginError::from(failure)
            })?;

        let user = self
            .user_store
            .fetch_user(&auth.user_id, &UserFields::default_fields())
            .await?
            .ok_or_else(|| ServiceError::not_found("User", &auth.user_id))?;

        let mut data = LoginData {
            user_id: user.id.clone(),
            auth_token: auth.token.clone(),
            me: self.user_info.derive_user_info(&user),
            extra: None,
        };

        if let Some(hook) = &self.on_logged_in {
            let context = LoginContext {
                request,
                body: &body,
                user: &user,
                user_id: &user.id,
                auth_token: &auth.token,
            };
            data.extra = hook.on_logged_in(&context).await;
        }

        info!(invocation = %invocation.id(), user_id = %user.id, "Login succeeded");
        Ok(LoginSuccess::new(body.qr, data))
    }
}
