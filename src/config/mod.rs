mod file_config;

pub use file_config::FileConfig;

use crate::client_ledger::DEFAULT_BUSY_TIMEOUT;
use anyhow::{bail, Context, Result};
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub client_id: Option<String>,
    pub heartbeat_interval_secs: u64,
    pub busy_timeout_ms: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            client_id: None,
            heartbeat_interval_secs: DEFAULT_HEARTBEAT_INTERVAL_SECS,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub client_id: String,
    pub heartbeat_interval: Duration,
    pub busy_timeout: Duration,
    pub metadata: Option<JsonValue>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via --db-path or in config file")
            })?;

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                bail!("Database directory does not exist: {:?}", parent);
            }
        }
        if db_path.is_dir() {
            bail!("db_path is a directory: {:?}", db_path);
        }

        let client_id = file
            .client_id
            .or_else(|| cli.client_id.clone())
            .unwrap_or_else(default_client_id);
        if client_id.trim().is_empty() {
            bail!("client_id must not be empty");
        }

        let heartbeat_interval_secs = file
            .heartbeat_interval_secs
            .unwrap_or(cli.heartbeat_interval_secs);
        if heartbeat_interval_secs == 0 {
            bail!("heartbeat_interval_secs must be greater than zero");
        }

        let busy_timeout_ms = file.busy_timeout_ms.unwrap_or(cli.busy_timeout_ms);

        let metadata = file
            .metadata
            .map(serde_json::to_value)
            .transpose()
            .context("Failed to convert client metadata to JSON")?;

        Ok(Self {
            db_path,
            client_id,
            heartbeat_interval: Duration::from_secs(heartbeat_interval_secs),
            busy_timeout: Duration::from_millis(busy_timeout_ms),
            metadata,
        })
    }
}

/// `<hostname>-<random suffix>`, falling back to `client` when the host is unknown.
fn default_client_id() -> String {
    let host = std::env::var("HOSTNAME")
        .ok()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "client".to_string());
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", host, &suffix[..8])
}
