//! Error taxonomy of the login-compatibility endpoint.

use crate::auth::models::LoginErrorBody;
use crate::errors::ServiceError;
use axum::http::StatusCode;
use thiserror::Error;

/// Failure reported by an authenticator.
///
/// The authenticator decides whether the identity was unknown; the adapter
/// never inspects message text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("User not found")]
    UnknownUser,
    #[error("{message}")]
    Rejected { error: String, message: String },
}

impl AuthFailure {
    pub fn rejected(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            error: error.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoginError {
    /// Malformed body, reported before any collaborator is contacted.
    #[error("{0}")]
    Validation(String),

    /// Unknown identity. Deliberately indistinguishable from a bad credential.
    #[error("Unauthorized")]
    Unauthorized,

    /// Any other authentication failure, passed through as reported.
    #[error("{message}")]
    AuthenticationFailure { error: String, message: String },

    #[error(transparent)]
    Internal(#[from] ServiceError),
}

impl From<AuthFailure> for LoginError {
    fn from(failure: AuthFailure) -> Self {
        match failure {
            AuthFailure::UnknownUser => LoginError::Unauthorized,
            // NOTE: the message reaches API clients verbatim, whatever the
            // authenticator put in it.
            AuthFailure::Rejected { error, message } => {
                LoginError::AuthenticationFailure { error, message }
            }
        }
    }
}

impl LoginError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LoginError::Validation(_) => StatusCode::BAD_REQUEST,
            LoginError::Unauthorized | LoginError::AuthenticationFailure { .. } => {
                StatusCode::UNAUTHORIZED
            }
            LoginError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Renders the legacy `{status: "error", error, message}` body.
    pub fn into_body(self) -> LoginErrorBody {
        match self {
            LoginError::Validation(message) => LoginErrorBody::new("ValidationError", message),
            LoginError::Unauthorized => LoginErrorBody::new("Unauthorized", "Unauthorized"),
            LoginError::AuthenticationFailure { error, message } => {
                LoginErrorBody::new(error, message)
            }
            LoginError::Internal(source) => {
                tracing::error!("Login failed after authentication: {}", source);
                LoginErrorBody::new("InternalError", "Internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_user_is_generalized() {
        let body = LoginError::from(AuthFailure::UnknownUser).into_body();
        assert_eq!(body.error, "Unauthorized");
        assert_eq!(body.message, "Unauthorized");
        assert!(!body.message.contains("User not found"));
    }

    #[test]
    fn test_rejection_is_passed_through() {
        let error = LoginError::from(AuthFailure::rejected("403", "Incorrect password"));
        assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);

        let body = error.into_body();
        assert_eq!(body.status, "error");
        assert_eq!(body.error, "403");
        assert_eq!(body.message, "Incorrect password");
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let error = LoginError::from(ServiceError::internal_error("disk on fire"));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.into_body().message, "Internal server error");
    }
}
