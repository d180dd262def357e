//! Access tokens for the end-to-end-encryption key service.
//!
//! Clients present these tokens to the external E2E service, which trusts
//! them because they are signed with the application key shared with it.
//! The identity is the user's verified email, falling back to the username
//! and then the user id.

use crate::auth::collaborators::LoginHook;
use crate::auth::models::{LoginContext, UserRecord};
use crate::config::E2eConfig;
use crate::errors::{ServiceError, ServiceResult};
use crate::utils::jwt::expiry_after;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct E2eClaims {
    /// `e2e-{app_id}`
    pub iss: String,
    /// `identity-{identity}`
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct E2eToken {
    pub token: String,
    pub expires_in: u64,
}

pub struct E2eTokenIssuer {
    app_id: String,
    app_key_id: String,
    encoding_key: EncodingKey,
    ttl_seconds: u64,
}

impl E2eTokenIssuer {
    pub fn new(config: &E2eConfig) -> ServiceResult<Self> {
        let key = general_purpose::STANDARD
            .decode(config.app_key_base64.trim())
            .map_err(|e| ServiceError::validation(format!("Invalid E2E app key: {}", e)))?;
        if key.is_empty() {
            return Err(ServiceError::validation("E2E app key is empty"));
        }

        Ok(Self {
            app_id: config.app_id.clone(),
            app_key_id: config.app_key_id.clone(),
            encoding_key: EncodingKey::from_secret(&key),
            ttl_seconds: config.token_ttl_seconds,
        })
    }

    pub fn issue(&self, identity: &str) -> ServiceResult<E2eToken> {
        let now = Utc::now();
        let exp = expiry_after(now, self.ttl_seconds)?;

        let claims = E2eClaims {
            iss: format!("e2e-{}", self.app_id),
            sub: format!("identity-{}", identity),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        };

        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(self.app_key_id.clone());

        let token = encode(&header, &claims, &self.encoding_key).map_err(|e| {
            ServiceError::internal_error(format!("E2E token generation failed: {}", e))
        })?;

        Ok(E2eToken {
            token,
            expires_in: self.ttl_seconds,
        })
    }
}

/// Identity under which a user is known to the E2E service.
pub fn identity_for(user: &UserRecord) -> &str {
    user.verified_email()
        .or_else(|| user.username())
        .unwrap_or(&user.id)
}

/// Attaches an E2E token to every successful login as `{"e2eToken": ...}`.
pub struct E2eTokenHook {
    issuer: Arc<E2eTokenIssuer>,
}

impl E2eTokenHook {
    pub fn new(issuer: Arc<E2eTokenIssuer>) -> Self {
        Self { issuer }
    }
}

#[async_trait]
impl LoginHook for E2eTokenHook {
    async fn on_logged_in(&self, context: &LoginContext<'_>) -> Option<Value> {
        match self.issuer.issue(identity_for(context.user)) {
            Ok(token) => Some(json!({ "e2eToken": token.token })),
            Err(e) => {
                // The login itself succeeded; the client can fetch a token later.
                warn!(
                    user_id = %context.user_id,
                    qr = %context.body.qr,
                    "Could not issue E2E token: {}",
                    e
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{LoginBody, RequestContext};
    use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};

    fn config() -> E2eConfig {
        E2eConfig {
            app_id: "app-1".into(),
            app_key_id: "key-1".into(),
            app_key_base64: general_purpose::STANDARD.encode(b"e2e-shared-secret"),
            token_ttl_seconds: 1200,
        }
    }

    fn decode_claims(token: &str) -> E2eClaims {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        decode::<E2eClaims>(
            token,
            &DecodingKey::from_secret(b"e2e-shared-secret"),
            &validation,
        )
        .unwrap()
        .claims
    }

    #[test]
    fn test_issued_token_claims() {
        let issuer = E2eTokenIssuer::new(&config()).unwrap();
        let token = issuer.issue("alice@x.com").unwrap();

        assert_eq!(token.expires_in, 1200);
        let claims = decode_claims(&token.token);
        assert_eq!(claims.iss, "e2e-app-1");
        assert_eq!(claims.sub, "identity-alice@x.com");
        assert_eq!(claims.exp - claims.iat, 1200);
        assert_eq!(decode_header(&token.token).unwrap().kid.as_deref(), Some("key-1"));
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        let issuer = E2eTokenIssuer::new(&E2eConfig {
            token_ttl_seconds: 10_000_000_000_000_000,
            ..config()
        })
        .unwrap();
        assert!(matches!(
            issuer.issue("alice"),
            Err(ServiceError::InternalError { .. })
        ));
    }

    #[test]
    fn test_invalid_key_is_rejected() {
        let mut bad = config();
        bad.app_key_base64 = "%%%".into();
        assert!(E2eTokenIssuer::new(&bad).is_err());
    }

    #[test]
    fn test_identity_fallbacks() {
        let mut record = UserRecord::new("u1");
        assert_eq!(identity_for(&record), "u1");

        record.fields.insert("username".into(), json!("alice"));
        assert_eq!(identity_for(&record), "alice");

        record.fields.insert(
            "emails".into(),
            json!([{"address": "alice@x.com", "verified": true}]),
        );
        assert_eq!(identity_for(&record), "alice@x.com");
    }

    #[tokio::test]
    async fn test_hook_returns_token_as_extra() {
        let hook = E2eTokenHook::new(Arc::new(E2eTokenIssuer::new(&config()).unwrap()));
        let request = RequestContext::new(json!({"qr": "q", "user": "alice", "password": "pw"}));
        let body = LoginBody::from_value(&request.body).unwrap();
        let mut user = UserRecord::new("u1");
        user.fields.insert("username".into(), json!("alice"));

        let context = LoginContext {
            request: &request,
            body: &body,
            user: &user,
            user_id: "u1",
            auth_token: "tok",
        };
        let extra = hook.on_logged_in(&context).await.unwrap();

        let claims = decode_claims(extra["e2eToken"].as_str().unwrap());
        assert_eq!(claims.sub, "identity-alice");
    }
}
