//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the database URL, server port, session token secrets, the bootstrap admin
//! account and the end-to-end-encryption token issuer.

use anyhow::{Context, Result, bail};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_expires_in_seconds: u64,
    pub server_port: u16,
    /// Public base URL, used to build avatar links in user info.
    pub site_url: String,
    pub admin: Option<AdminBootstrap>,
    pub e2e: Option<E2eConfig>,
}

/// Credentials for the admin user created on first start.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Settings for issuing end-to-end-encryption service tokens.
#[derive(Debug, Clone)]
pub struct E2eConfig {
    pub app_id: String,
    pub app_key_id: String,
    /// Base64-encoded signing key.
    pub app_key_base64: String,
    pub token_ttl_seconds: u64,
}

/// Longest accepted token lifetime (ten years).
pub const MAX_TOKEN_TTL_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL not set")?;

        let max_connections = lookup("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = lookup("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|| "3".to_string())
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET not set")?;

        let jwt_expires_in_seconds = token_ttl(&lookup, "JWT_EXPIRES_IN_SECONDS", 86400)?;

        let server_port = lookup("SERVER_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        let site_url = lookup("SITE_URL")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Config {
            database_url,
            max_connections,
            acquire_timeout_seconds,
            jwt_secret,
            jwt_expires_in_seconds,
            server_port,
            site_url,
            admin: admin_from(&lookup)?,
            e2e: e2e_from(&lookup)?,
        })
    }
}

fn token_ttl(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64> {
    let ttl = match lookup(key) {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{key} must be a valid number"))?,
        None => default,
    };
    if ttl == 0 || ttl > MAX_TOKEN_TTL_SECONDS {
        bail!("{key} must be between 1 and {MAX_TOKEN_TTL_SECONDS} seconds");
    }
    Ok(ttl)
}

fn admin_from(lookup: &impl Fn(&str) -> Option<String>) -> Result<Option<AdminBootstrap>> {
    let Some(username) = lookup("ADMIN_USERNAME") else {
        return Ok(None);
    };

    let password = lookup("ADMIN_PASSWORD")
        .context("ADMIN_PASSWORD must be set when ADMIN_USERNAME is set")?;
    let email = lookup("ADMIN_EMAIL").unwrap_or_else(|| format!("{username}@localhost"));

    Ok(Some(AdminBootstrap {
        username,
        email,
        password,
    }))
}

fn e2e_from(lookup: &impl Fn(&str) -> Option<String>) -> Result<Option<E2eConfig>> {
    let settings = (
        lookup("E2E_APP_ID"),
        lookup("E2E_APP_KEY_ID"),
        lookup("E2E_APP_KEY_BASE64"),
    );

    let (app_id, app_key_id, app_key_base64) = match settings {
        (None, None, None) => return Ok(None),
        (Some(id), Some(key_id), Some(key)) => (id, key_id, key),
        _ => bail!("E2E_APP_ID, E2E_APP_KEY_ID and E2E_APP_KEY_BASE64 must be set together"),
    };

    Ok(Some(E2eConfig {
        app_id,
        app_key_id,
        app_key_base64,
        token_ttl_seconds: token_ttl(lookup, "E2E_TOKEN_TTL_SECONDS", 1200)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    const BASE: [(&str, &str); 2] = [("DATABASE_URL", "sqlite::memory:"), ("JWT_SECRET", "s")];

    fn with_base(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        BASE.iter().chain(extra).copied().collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(source(&BASE)).unwrap();
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.jwt_expires_in_seconds, 86400);
        assert_eq!(config.server_port, 3000);
        assert!(config.admin.is_none());
        assert!(config.e2e.is_none());
    }

    #[test]
    fn test_required_settings() {
        assert!(Config::from_lookup(source(&[("JWT_SECRET", "s")])).is_err());
        assert!(Config::from_lookup(source(&[("DATABASE_URL", "sqlite::memory:")])).is_err());
    }

    #[test]
    fn test_e2e_settings_all_or_none() {
        let vars = with_base(&[
            ("E2E_APP_ID", "app"),
            ("E2E_APP_KEY_ID", "kid"),
            ("E2E_APP_KEY_BASE64", "c2VjcmV0"),
        ]);
        let e2e = Config::from_lookup(source(&vars)).unwrap().e2e.unwrap();
        assert_eq!(e2e.app_id, "app");
        assert_eq!(e2e.token_ttl_seconds, 1200);

        let partial = with_base(&[("E2E_APP_ID", "app"), ("E2E_APP_KEY_ID", "kid")]);
        assert!(Config::from_lookup(source(&partial)).is_err());
    }

    #[test]
    fn test_admin_requires_password() {
        let vars = with_base(&[("ADMIN_USERNAME", "root")]);
        assert!(Config::from_lookup(source(&vars)).is_err());

        let vars = with_base(&[("ADMIN_USERNAME", "root"), ("ADMIN_PASSWORD", "pw")]);
        let admin = Config::from_lookup(source(&vars)).unwrap().admin.unwrap();
        assert_eq!(admin.email, "root@localhost");
    }

    #[test]
    fn test_token_lifetimes_are_bounded() {
        for ttl in ["soon", "0", "18446744073709551615", "315360001"] {
            let vars = with_base(&[("JWT_EXPIRES_IN_SECONDS", ttl)]);
            assert!(Config::from_lookup(source(&vars)).is_err(), "{ttl}");

            let vars = with_base(&[
                ("E2E_APP_ID", "app"),
                ("E2E_APP_KEY_ID", "kid"),
                ("E2E_APP_KEY_BASE64", "c2VjcmV0"),
                ("E2E_TOKEN_TTL_SECONDS", ttl),
            ]);
            assert!(Config::from_lookup(source(&vars)).is_err(), "{ttl}");
        }

        let vars = with_base(&[("JWT_EXPIRES_IN_SECONDS", "315360000")]);
        assert!(Config::from_lookup(source(&vars)).is_ok());
    }
}
