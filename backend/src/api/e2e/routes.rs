use super::handlers::get_e2e_token;
use crate::auth::middleware::jwt_auth;
use axum::{Router, middleware, routing::get};

pub fn e2e_router() -> Router {
    Router::new().route(
        "/jwt",
        get(get_e2e_token).layer(middleware::from_fn(jwt_auth)),
    )
}
