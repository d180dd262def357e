//! Maps legacy login bodies onto `Credentials`.
//!
//! Accepted shapes, in order of precedence:
//! - `{resume}`: session token from an earlier login;
//! - `{user | identifier, password | secret}`: `user` is an email address
//!   when it contains `@`, a username otherwise;
//! - `{username, password}` and `{email, password}`.
//!
//! A password is either the plain string or `{digest, algorithm: "sha-256"}`.

use crate::auth::errors::LoginError;
use crate::auth::models::{Credentials, LoginBody, Password, PasswordField, UserSelector};

pub fn normalize(body: &LoginBody) -> Result<Credentials, LoginError> {
    if let Some(token) = &body.resume {
        return Ok(Credentials::Resume {
            token: token.clone(),
        });
    }

    let user = select_user(body).ok_or_else(missing_credentials)?;
    let password = body.password.as_ref().ok_or_else(missing_credentials)?;

    Ok(Credentials::Password {
        user,
        password: normalize_password(password)?,
    })
}

fn missing_credentials() -> LoginError {
    LoginError::Validation("Match error: Missing login credentials".to_string())
}

fn select_user(body: &LoginBody) -> Option<UserSelector> {
    if let Some(user) = &body.user {
        return Some(if user.contains('@') {
            UserSelector::Email(user.clone())
        } else {
            UserSelector::Username(user.clone())
        });
    }

    body.username
        .clone()
        .map(UserSelector::Username)
        .or_else(|| body.email.clone().map(UserSelector::Email))
}

fn normalize_password(password: &PasswordField) -> Result<Password, LoginError> {
    match password {
        PasswordField::Plain(plain) if plain.is_empty() => Err(LoginError::Validation(
            "password: Password is required".to_string(),
        )),
        PasswordField::Plain(plain) => Ok(Password::Plain(plain.clone())),
        PasswordField::Hashed { digest, algorithm } => {
            if !algorithm.eq_ignore_ascii_case("sha-256") {
                return Err(LoginError::Validation(format!(
                    "password: Unsupported digest algorithm '{algorithm}'"
                )));
            }

            let is_sha256_hex = hex::decode(digest).is_ok_and(|bytes| bytes.len() == 32);
            if !is_sha256_hex {
                return Err(LoginError::Validation(
                    "password: Digest must be a hex-encoded SHA-256 value".to_string(),
                ));
            }

            Ok(Password::Digest(digest.to_ascii_lowercase()))
        }
    }
}
