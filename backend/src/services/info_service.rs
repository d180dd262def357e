//! Server version and build information for the info endpoint.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub platform: &'static str,
    pub arch: &'static str,
    pub cpus: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub version: &'static str,
    pub build: BuildInfo,
    pub started_at: String,
}

impl ServerInfo {
    pub fn collect(started_at: DateTime<Utc>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            build: BuildInfo {
                platform: std::env::consts::OS,
                arch: std::env::consts::ARCH,
                cpus: std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1),
            },
            started_at: started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// What anonymous callers get to see.
#[derive(Debug, Serialize)]
pub struct PublicInfo {
    pub version: &'static str,
}

/// Expanded view for administrators.
#[derive(Debug, Serialize)]
pub struct AdminInfo {
    pub version: &'static str,
    pub info: ServerInfo,
}

impl ServerInfo {
    pub fn public_view(&self) -> PublicInfo {
        PublicInfo {
            version: self.version,
        }
    }

    pub fn admin_view(&self) -> AdminInfo {
        AdminInfo {
            version: self.version,
            info: self.clone(),
        }
    }
}
