//! Data structures for the login-compatibility flow.
//!
//! This module defines the legacy request body, the normalized credentials
//! handed to the authenticator, the user projection read after a successful
//! login, and the legacy response envelope.

use crate::auth::errors::LoginError;
use crate::utils::jwt::Claims;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;
use validator::Validate;

/// Legacy login request body.
///
/// `qr` is a correlation token that is echoed back unchanged. The remaining
/// fields are the credential shapes understood by older clients.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginBody {
    pub qr: String,

    /// Username or email address.
    #[serde(default, alias = "identifier")]
    #[validate(length(min = 1, message = "User is required"))]
    pub user: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: Option<String>,

    #[serde(default)]
    #[validate(email(message = "Must be a valid email"))]
    pub email: Option<String>,

    #[serde(default, alias = "secret")]
    pub password: Option<PasswordField>,

    /// Session token from a previous login.
    #[serde(default)]
    #[validate(length(min = 1, message = "Resume token is required"))]
    pub resume: Option<String>,
}

impl LoginBody {
    /// Parses and validates a raw request body.
    ///
    /// The `qr` check runs first so a malformed correlation token is always
    /// reported, whatever else is wrong with the body.
    pub fn from_value(value: &Value) -> Result<Self, LoginError> {
        let object = value.as_object().ok_or_else(|| {
            LoginError::Validation(format!(
                "Match error: Expected object, got {}",
                json_type_name(value)
            ))
        })?;

        match object.get("qr") {
            None => {
                return Err(LoginError::Validation(
                    "Match error: Missing key 'qr'".to_string(),
                ));
            }
            Some(Value::String(_)) => {}
            Some(other) => {
                return Err(LoginError::Validation(format!(
                    "Match error: Expected string, got {} in field qr",
                    json_type_name(other)
                )));
            }
        }

        let body: LoginBody = serde_json::from_value(value.clone())
            .map_err(|e| LoginError::Validation(format!("Match error: {e}")))?;

        if let Err(validation_errors) = body.validate() {
            let error_messages: Vec<String> = validation_errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, errors)| {
                    errors.iter().map(move |error| {
                        format!(
                            "{}: {}",
                            field,
                            error.message.as_ref().unwrap_or(&"Invalid value".into())
                        )
                    })
                })
                .collect();
            return Err(LoginError::Validation(error_messages.join(", ")));
        }

        Ok(body)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Password as sent by the client: plain text, or its SHA-256 digest.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum PasswordField {
    Plain(String),
    Hashed { digest: String, algorithm: String },
}

impl fmt::Debug for PasswordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordField::Plain(_) => f.write_str("Plain(<redacted>)"),
            PasswordField::Hashed { algorithm, .. } => f
                .debug_struct("Hashed")
                .field("algorithm", algorithm)
                .finish_non_exhaustive(),
        }
    }
}

/// How the user to log in is identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserSelector {
    Username(String),
    Email(String),
}

/// Normalized password.
#[derive(Clone, PartialEq, Eq)]
pub enum Password {
    Plain(String),
    /// Lowercase hex SHA-256 digest of the plain password.
    Digest(String),
}

impl Password {
    /// Hex SHA-256 digest, which is what stored bcrypt hashes are computed over.
    pub fn digest(&self) -> String {
        match self {
            Password::Plain(plain) => hex::encode(Sha256::digest(plain.as_bytes())),
            Password::Digest(digest) => digest.clone(),
        }
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Password::Plain(_) => f.write_str("Plain(<redacted>)"),
            Password::Digest(_) => f.write_str("Digest(<redacted>)"),
        }
    }
}

/// Credentials in the shape the authenticator expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Password {
        user: UserSelector,
        password: Password,
    },
    Resume {
        token: String,
    },
}

/// Successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResult {
    pub user_id: String,
    pub token: String,
}

/// Allow-listed user fields readable by the login flow.
#[derive(Debug, Clone, Copy)]
pub struct UserFields(&'static [&'static str]);

impl UserFields {
    const DEFAULT: &'static [&'static str] = &[
        "name",
        "username",
        "emails",
        "status",
        "statusText",
        "utcOffset",
        "language",
        "active",
        "roles",
        "createdAt",
    ];

    pub fn default_fields() -> Self {
        Self(Self::DEFAULT)
    }

    pub fn only(fields: &'static [&'static str]) -> Self {
        Self(fields)
    }

    pub fn includes(&self, field: &str) -> bool {
        self.0.contains(&field)
    }
}

/// Projection of a user, restricted to a `UserFields` allow-list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl UserRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Adds `value` under `field` when the allow-list includes it.
    pub fn project(&mut self, allowed: &UserFields, field: &str, value: impl Into<Value>) {
        if allowed.includes(field) {
            self.fields.insert(field.to_string(), value.into());
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn username(&self) -> Option<&str> {
        self.get("username").and_then(Value::as_str)
    }

    /// First verified address from the `emails` field.
    pub fn verified_email(&self) -> Option<&str> {
        self.get("emails")?
            .as_array()?
            .iter()
            .find(|entry| entry.get("verified").and_then(Value::as_bool) == Some(true))
            .and_then(|entry| entry.get("address"))
            .and_then(Value::as_str)
    }
}

/// Explicit per-request state handed to the login adapter.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Raw JSON body; validated by the adapter.
    pub body: Value,
    /// Caller identity, when the request carried a valid session token.
    pub caller: Option<Claims>,
}

impl RequestContext {
    pub fn new(body: Value) -> Self {
        Self { body, caller: None }
    }

    pub fn with_caller(mut self, caller: Option<Claims>) -> Self {
        self.caller = caller;
        self
    }
}

/// What a post-login hook gets to see.
#[derive(Debug)]
pub struct LoginContext<'a> {
    #[allow(dead_code)]
    pub request: &'a RequestContext,
    pub body: &'a LoginBody,
    pub user: &'a UserRecord,
    pub user_id: &'a str,
    #[allow(dead_code)]
    pub auth_token: &'a str,
}

/// Legacy response envelope.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LoginEnvelope {
    Success(LoginSuccess),
    Error(LoginErrorBody),
}

#[derive(Debug, Serialize)]
pub struct LoginSuccess {
    pub status: &'static str,
    pub qr: String,
    pub data: LoginData,
}

impl LoginSuccess {
    pub fn new(qr: String, data: LoginData) -> Self {
        Self {
            status: "success",
            qr,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user_id: String,
    pub auth_token: String,
    pub me: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct LoginErrorBody {
    pub status: &'static str,
    pub error: String,
    pub message: String,
}

impl LoginErrorBody {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: "error",
            error: error.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_qr_must_be_present_and_a_string() {
        let missing = LoginBody::from_value(&json!({"user": "alice", "password": "pw"}));
        assert!(matches!(missing, Err(LoginError::Validation(m)) if m.contains("'qr'")));

        let number = LoginBody::from_value(&json!({"qr": 42, "user": "alice"}));
        assert!(
            matches!(number, Err(LoginError::Validation(m)) if m.contains("got number in field qr"))
        );

        let not_object = LoginBody::from_value(&json!(["qr"]));
        assert!(matches!(not_object, Err(LoginError::Validation(_))));
    }

    #[test]
    fn test_aliases_are_accepted() {
        let body = LoginBody::from_value(&json!({
            "qr": "abc123",
            "identifier": "alice",
            "secret": "pw"
        }))
        .unwrap();

        assert_eq!(body.qr, "abc123");
        assert_eq!(body.user.as_deref(), Some("alice"));
        assert!(matches!(body.password, Some(PasswordField::Plain(ref p)) if p == "pw"));
    }

    #[test]
    fn test_invalid_email_is_rejected() {
        let result = LoginBody::from_value(&json!({
            "qr": "abc",
            "email": "not-an-email",
            "password": "pw"
        }));
        assert!(matches!(result, Err(LoginError::Validation(m)) if m.starts_with("email:")));
    }

    #[test]
    fn test_password_digest_matches_sha256() {
        let plain = Password::Plain("pw".to_string());
        assert_eq!(
            plain.digest(),
            "30c952fab122c3f9759f02a6d95c3758b246b4fee239957b2d4fee46e26170c4"
        );
        assert_eq!(Password::Digest(plain.digest()), Password::Digest(plain.digest()));
        assert_eq!(format!("{plain:?}"), "Plain(<redacted>)");
    }

    #[test]
    fn test_projection_respects_allow_list() {
        let fields = UserFields::only(&["username"]);
        let mut record = UserRecord::new("u1");
        record.project(&fields, "username", "alice");
        record.project(&fields, "password_hash", "secret");

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"_id": "u1", "username": "alice"})
        );
    }

    #[test]
    fn test_verified_email_skips_unverified_entries() {
        let mut record = UserRecord::new("u1");
        record.fields.insert(
            "emails".to_string(),
            json!([
                {"address": "old@x.com", "verified": false},
                {"address": "alice@x.com", "verified": true}
            ]),
        );
        assert_eq!(record.verified_email(), Some("alice@x.com"));
    }
}
