//! TOML configuration for the Nest daemon.

use std::path::{Path, PathBuf};

use nest_tenant::IsolationMode;
use serde::Deserialize;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Chunk storage layout.
    pub storage: StorageSection,
    /// HTTP API settings.
    pub http: HttpSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[storage]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Directory for persistent data (tenant roots, metadata DB).
    pub base_dir: PathBuf,
    /// Backend type: `"file"` (default) or `"memory"`.
    pub backend: String,
    /// Isolation mode: `"isolated"` (default, per-tenant roots) or
    /// `"shared"` (one global chunk directory, cross-tenant dedup).
    pub isolation: String,
    /// Per-tenant quota in bytes. Omit for unlimited.
    pub quota_bytes: Option<u64>,
}

impl Default for StorageSection {
    fn default() -> Self {
        let base_dir = dirs::home_dir()
            .map(|h| h.join(".nest"))
            .unwrap_or_else(|| PathBuf::from(".nest"));
        Self {
            base_dir,
            backend: "file".to_string(),
            isolation: "isolated".to_string(),
            quota_bytes: None,
        }
    }
}

/// `[http]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    /// Address for the HTTP API.
    pub listen_addr: String,
    /// Maximum accepted upload body size in bytes.
    pub max_upload_bytes: usize,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:4860".to_string(),
            // 1 GiB, generous headroom over the typical upload.
            max_upload_bytes: 1024 * 1024 * 1024,
        }
    }
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file, or defaults if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                let config: CliConfig = toml::from_str(&content)?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Effective isolation mode. Unrecognized values fall back to
    /// isolated, the safe default.
    pub fn isolation_mode(&self) -> IsolationMode {
        match self.storage.isolation.as_str() {
            "shared" => IsolationMode::Shared,
            _ => IsolationMode::Isolated,
        }
    }

    /// Whether the memory backend was selected.
    pub fn memory_backend(&self) -> bool {
        self.storage.backend == "memory"
    }
}
