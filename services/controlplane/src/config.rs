//! Control-plane configuration.
//!
//! # Purpose
//! Loads runtime settings from `HAVEN_*` environment variables with sane
//! defaults, optionally overlaid by a YAML file named via `HAVEN_CP_CONFIG`.
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct ControlPlaneConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    /// Base URL stamped into shareable invite links.
    pub public_base_url: String,
    pub changes_limit: u64,
    pub change_retention_max_rows: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ControlPlaneConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    public_base_url: Option<String>,
    changes_limit: Option<u64>,
    change_retention_max_rows: Option<i64>,
}

impl ControlPlaneConfig {
    pub fn from_env() -> Result<Self> {
        let metrics_bind = std::env::var("HAVEN_CP_METRICS_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .with_context(|| "parse HAVEN_CP_METRICS_BIND")?;
        let bind_addr = std::env::var("HAVEN_CP_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8443".to_string())
            .parse()
            .with_context(|| "parse HAVEN_CP_BIND")?;
        let public_base_url = std::env::var("HAVEN_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8443".to_string());
        let changes_limit = std::env::var("HAVEN_CHANGES_LIMIT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(500);
        let change_retention_max_rows = std::env::var("HAVEN_CHANGE_RETENTION_MAX_ROWS")
            .ok()
            .and_then(|value| value.parse().ok());
        Ok(Self {
            bind_addr,
            metrics_bind,
            public_base_url,
            changes_limit,
            change_retention_max_rows,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("HAVEN_CP_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read HAVEN_CP_CONFIG: {path}"))?;
            let override_cfg: ControlPlaneConfigOverride = serde_yaml::from_str(&contents)
                .with_context(|| "parse control plane config yaml")?;
            if let Some(value) = override_cfg.bind_addr {
                config.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
            }
            if let Some(value) = override_cfg.metrics_bind {
                config.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
            }
            if let Some(value) = override_cfg.public_base_url {
                config.public_base_url = value;
            }
            if let Some(value) = override_cfg.changes_limit {
                config.changes_limit = value;
            }
            if let Some(value) = override_cfg.change_retention_max_rows {
                config.change_retention_max_rows = Some(value);
            }
        }
        Ok(config)
    }
}
