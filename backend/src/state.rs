//! Shared application state handed to handlers through `Extension`.

use crate::auth::collaborators::{RoleChecker, UserStore};
use crate::auth::service::LoginCompatService;
use crate::config::Config;
use crate::errors::ServiceResult;
use crate::repositories::role_repository::RoleRepository;
use crate::repositories::user_repository::UserRepository;
use crate::services::authentication_service::PasswordAuthenticator;
use crate::services::e2e_token_service::{E2eTokenHook, E2eTokenIssuer};
use crate::services::info_service::ServerInfo;
use crate::services::user_info_service::DefaultUserInfo;
use crate::utils::jwt::JwtUtils;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub jwt: Arc<JwtUtils>,
    pub login: LoginCompatService,
    pub users: Arc<dyn UserStore>,
    pub roles: Arc<dyn RoleChecker>,
    pub e2e: Option<Arc<E2eTokenIssuer>>,
    pub info: Arc<ServerInfo>,
}

impl AppState {
    /// Wires the SQLite-backed collaborators together.
    pub fn new(pool: SqlitePool, config: &Config) -> ServiceResult<Self> {
        let jwt = Arc::new(JwtUtils::new(
            &config.jwt_secret,
            config.jwt_expires_in_seconds,
        ));
        let users = UserRepository::new(pool.clone());
        let roles = Arc::new(RoleRepository::new(pool));

        let e2e = config
            .e2e
            .as_ref()
            .map(E2eTokenIssuer::new)
            .transpose()?
            .map(Arc::new);

        let mut login = LoginCompatService::new(
            Arc::new(PasswordAuthenticator::new(users.clone(), jwt.clone())),
            Arc::new(users.clone()),
            Arc::new(DefaultUserInfo::new(config.site_url.clone())),
        );
        if let Some(issuer) = &e2e {
            login = login.with_login_hook(Arc::new(E2eTokenHook::new(issuer.clone())));
        }

        Ok(Self {
            jwt,
            login,
            users: Arc::new(users),
            roles,
            e2e,
            info: Arc::new(ServerInfo::collect(Utc::now())),
        })
    }
}
