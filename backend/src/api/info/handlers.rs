//! Handler for the server information endpoint.
//!
//! Anyone may ask for the version; administrators get the build details
//! as well.

use crate::api::common::service_error_to_http;
use crate::state::AppState;
use crate::utils::jwt::Claims;
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

const ADMIN_ROLE: &str = "admin";

#[axum::debug_handler]
pub async fn get_info(
    Extension(state): Extension<AppState>,
    Extension(caller): Extension<Option<Claims>>,
) -> Result<Response, (StatusCode, String)> {
    if let Some(claims) = &caller {
        let is_admin = state
            .roles
            .has_role(claims.user_id(), ADMIN_ROLE)
            .await
            .map_err(service_error_to_http)?;

        if is_admin {
            return Ok(Json(state.info.admin_view()).into_response());
        }
    }

    Ok(Json(state.info.public_view()).into_response())
}
