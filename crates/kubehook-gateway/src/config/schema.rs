use std::net::SocketAddr;

use serde::Deserialize;
use kubehook_core::error::{KubehookError, Result};

/// Paths served by the ops endpoints; the review route may not shadow them.
pub const RESERVED_PATHS: [&str; 3] = ["/healthz", "/readyz", "/metrics"];

const MIN_BODY_BYTES: usize = 1024;
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(KubehookError::UnsupportedVersion);
        }

        self.gateway.validate()?;   // Verify the scope of value

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Route the API server posts reviews to.
    #[serde(default = "default_review_path")]
    pub review_path: String,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            review_path: default_review_path(),
            max_body_bytes: default_max_body_bytes(),
            service_name: default_service_name(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !self.review_path.starts_with('/') {
            return Err(KubehookError::BadConfig(
                "gateway.review_path must start with '/'".into(),
            ));
        }
        if RESERVED_PATHS.contains(&self.review_path.as_str()) {
            return Err(KubehookError::BadConfig(format!(
                "gateway.review_path must not be one of {RESERVED_PATHS:?}"
            )));
        }
        if !(MIN_BODY_BYTES..=MAX_BODY_BYTES).contains(&self.max_body_bytes) {
            return Err(KubehookError::BadConfig(format!(
                "gateway.max_body_bytes must be between {MIN_BODY_BYTES} and {MAX_BODY_BYTES}"
            )));
        }
        if self.service_name.trim().is_empty() {
            return Err(KubehookError::BadConfig(
                "gateway.service_name must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            KubehookError::BadConfig(format!("gateway.listen must be a valid SocketAddr: {e}"))
        })
    }
}

fn default_listen() -> String {
    "127.0.0.1:8000".into()
}
fn default_review_path() -> String {
    "/audit".into()
}
fn default_max_body_bytes() -> usize {
    4 * 1024 * 1024
}
fn default_service_name() -> String {
    "webhookreceiver".into()
}
