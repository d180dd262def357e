use super::handlers::get_info;
use crate::auth::middleware::optional_jwt_auth;
use axum::{Router, middleware, routing::get};

pub fn info_router() -> Router {
    Router::new().route(
        "/info",
        get(get_info).layer(middleware::from_fn(optional_jwt_auth)),
    )
}
