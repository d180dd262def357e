//! Defines the HTTP routes specifically for authentication.
//!
//! These are designed to be merged into the `/api` router.

use crate::auth::handlers::*;
use crate::auth::middleware::*;
use axum::{Router, middleware, routing::post};

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new().route(
        "/v1/nodechat.login",
        post(nodechat_login).layer(middleware::from_fn(optional_jwt_auth)),
    )
}
