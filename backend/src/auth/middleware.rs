//! Middleware for authenticating requests with session tokens.
//!
//! Tokens are read from `Authorization: Bearer <token>` or, for older
//! clients, from the `X-Auth-Token` header.

use crate::state::AppState;
use crate::utils::jwt::Claims;
use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

const LEGACY_TOKEN_HEADER: &str = "x-auth-token";

fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    bearer.or_else(|| {
        headers
            .get(LEGACY_TOKEN_HEADER)
            .and_then(|header| header.to_str().ok())
    })
}

fn validate(request: &Request, token: &str) -> Result<Option<Claims>, StatusCode> {
    let state = request
        .extensions()
        .get::<AppState>()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(state.jwt.validate_token(token).ok())
}

/// JWT authentication middleware
pub async fn jwt_auth(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    let token = token_from_headers(request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;
    let claims = validate(&request, token)?.ok_or(StatusCode::UNAUTHORIZED)?;

    // Add claims to request extensions for use in handlers
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Optional JWT authentication middleware (doesn't fail if no token)
pub async fn optional_jwt_auth(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    let claims = match token_from_headers(request.headers()) {
        Some(token) => validate(&request, token)?,
        None => None,
    };

    // Always insert the Option<Claims>, even if it's None
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
