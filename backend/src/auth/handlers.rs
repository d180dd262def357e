//! Handler functions for authentication-related API endpoints.

use crate::auth::errors::LoginError;
use crate::auth::models::{LoginEnvelope, RequestContext};
use crate::state::AppState;
use crate::utils::jwt::Claims;
use axum::{
    extract::{Extension, Json, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::Value;

/// Legacy login endpoint.
///
/// Malformed JSON is answered in the same envelope as every other
/// validation failure.
#[axum::debug_handler]
pub async fn nodechat_login(
    Extension(state): Extension<AppState>,
    Extension(caller): Extension<Option<Claims>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> (StatusCode, Json<LoginEnvelope>) {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            let error = LoginError::Validation(rejection.body_text());
            return (
                error.status_code(),
                Json(LoginEnvelope::Error(error.into_body())),
            );
        }
    };

    let request = RequestContext::new(body).with_caller(caller);
    let (status, envelope) = state.login.handle(request).await;
    (status, Json(envelope))
}
