//! Central module for organizing the application's API endpoints.
//!
//! `router` assembles every domain router under `/api` and attaches the
//! shared state.

pub mod common;
pub mod e2e;
pub mod info;

use crate::api::common::ApiResponse;
use crate::state::AppState;
use axum::{Extension, Router, response::Json, routing::get};

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(crate::auth::routes::auth_router())
        .merge(info::routes::info_router())
        .nest("/e2e", e2e::routes::e2e_router());

    Router::new()
        .route("/", get(root_handler))
        .nest("/api", api)
        .layer(Extension(state))
}

async fn root_handler() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(
        serde_json::json!({
            "service": "NodeChat Backend",
            "version": env!("CARGO_PKG_VERSION")
        }),
        "Welcome to NodeChat API",
    ))
}
