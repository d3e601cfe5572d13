//! Receiver config loader (strict parsing).

pub mod schema;

use std::fs;
use std::path::Path;

use kubehook_core::error::{KubehookError, Result};

pub use schema::{GatewayConfig, GatewaySection};

/// Env var naming the config file.
pub const CONFIG_ENV: &str = "KUBEHOOK_CONFIG";
/// Config file used when `KUBEHOOK_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "kubehook.yaml";

/// Load config from `KUBEHOOK_CONFIG`, else `kubehook.yaml` if present, else
/// built-in defaults.
pub fn load() -> Result<GatewayConfig> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => load_from_file(&path),
        Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => load_from_file(DEFAULT_CONFIG_PATH),
        Err(_) => {
            let cfg = GatewayConfig::default();
            cfg.validate()?;
            Ok(cfg)
        }
    }
}

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| KubehookError::BadConfig(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| KubehookError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
