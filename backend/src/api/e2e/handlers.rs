//! Handler issuing end-to-end-encryption service tokens to logged-in users.

use crate::api::common::{ApiResponse, service_error_to_http};
use crate::auth::models::UserFields;
use crate::errors::ServiceError;
use crate::services::e2e_token_service::{E2eToken, identity_for};
use crate::state::AppState;
use crate::utils::jwt::Claims;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
};

#[axum::debug_handler]
pub async fn get_e2e_token(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<E2eToken>>, (StatusCode, String)> {
    let issuer = state.e2e.as_ref().ok_or_else(|| {
        service_error_to_http(ServiceError::unavailable(
            "E2E token issuer is not configured",
        ))
    })?;

    let user = state
        .users
        .fetch_user(claims.user_id(), &UserFields::only(&["username", "emails"]))
        .await
        .map_err(service_error_to_http)?
        .ok_or_else(|| service_error_to_http(ServiceError::not_found("User", claims.user_id())))?;

    let token = issuer
        .issue(identity_for(&user))
        .map_err(service_error_to_http)?;

    tracing::info!("Issued E2E token for user: {}", user.id);
    Ok(Json(ApiResponse::success(token, "E2E token issued")))
}
