//! JWT session token utilities.
//!
//! Session tokens are the `authToken` handed out by a successful login and
//! accepted back through the `Authorization: Bearer` header or a `resume`
//! login.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;

/// JWT Claims structure for session tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub username: String,
    /// Token ID
    pub jti: String,
    /// Token expiration timestamp
    pub exp: usize,
    /// Token issued at timestamp
    pub iat: usize,
}

/// JWT token utility for creating and validating tokens
pub struct JwtUtils {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expires_in_seconds: u64,
}

impl JwtUtils {
    pub fn new(secret: &str, expires_in_seconds: u64) -> Self {
        let encoding_key = EncodingKey::from_secret(secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        JwtUtils {
            encoding_key,
            decoding_key,
            validation,
            expires_in_seconds,
        }
    }

    /// Generate a new session token for a user
    pub fn generate_token(&self, user_id: &str, username: &str) -> Result<String, ServiceError> {
        let now = Utc::now();
        let exp = expiry_after(now, self.expires_in_seconds)?;

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            jti: Uuid::now_v7().to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::internal_error(format!("Token generation failed: {}", e)))
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| ServiceError::validation(format!("Token validation failed: {}", e)))
    }
}

/// Expiry instant `ttl_seconds` after `now`, or an error if it is out of range.
pub fn expiry_after(
    now: DateTime<Utc>,
    ttl_seconds: u64,
) -> Result<DateTime<Utc>, ServiceError> {
    i64::try_from(ttl_seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| {
            ServiceError::internal_error(format!("Token lifetime out of range: {}s", ttl_seconds))
        })
}

impl Claims {
    pub fn user_id(&self) -> &str {
        &self.sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip_carries_identity() {
        let jwt = JwtUtils::new("test-secret", 60);
        let token = jwt.generate_token("u1", "alice").unwrap();
        let claims = jwt.validate_token(&token).unwrap();

        assert_eq!(claims.user_id(), "u1");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn test_tokens_are_unique() {
        let jwt = JwtUtils::new("test-secret", 60);
        let first = jwt.generate_token("u1", "alice").unwrap();
        let second = jwt.generate_token("u1", "alice").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        for ttl in [100_000_000_000_000, u64::MAX] {
            let jwt = JwtUtils::new("test-secret", ttl);
            assert!(matches!(
                jwt.generate_token("u1", "alice"),
                Err(ServiceError::InternalError { .. })
            ));
        }
    }

    #[test]
    fn test_foreign_or_expired_tokens_are_rejected() {
        let ours = JwtUtils::new("test-secret", 60);
        let theirs = JwtUtils::new("other-secret", 60);
        let token = theirs.generate_token("u1", "alice").unwrap();
        assert!(ours.validate_token(&token).is_err());

        // Expired beyond the default 60s leeway.
        let claims = Claims {
            sub: "u1".into(),
            username: "alice".into(),
            jti: "j".into(),
            exp: (Utc::now().timestamp() - 3600) as usize,
            iat: (Utc::now().timestamp() - 7200) as usize,
        };
        let expired = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(ours.validate_token(&expired).is_err());
    }
}
